//! 规则应用：移除查询参数、片段参数，执行原始文本规则

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::compiler::CompiledProvider;
use crate::utils::FragmentParams;

/// 规则应用结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Cleaned(Url),
    // 命中 completeProvider，调用方不得使用该URL
    Blocked,
}

/// 规则应用器
pub struct RuleApplicator;

impl RuleApplicator {
    /// 对已匹配站点的URL应用规则
    pub fn apply(mut url: Url, provider: &CompiledProvider, strip_referral_marketing: bool) -> ApplyOutcome {
        // 1. 整站拦截
        if provider.complete_provider {
            debug!("URL 被站点 {} 整站拦截：{}", provider.name, url);
            return ApplyOutcome::Blocked;
        }

        // 2. 例外规则
        if provider.is_exception(url.as_str()) {
            debug!("URL 命中站点 {} 的例外规则，保持不变：{}", provider.name, url);
            return ApplyOutcome::Cleaned(url);
        }

        // 3. 参数规则（查询 + 片段）
        let mut key_rules: Vec<&Regex> = provider.rules.iter().collect();
        if strip_referral_marketing {
            key_rules.extend(provider.referral_marketing.iter());
        }
        if !key_rules.is_empty() {
            Self::clean_query(&mut url, &key_rules);
            Self::clean_fragment(&mut url, &key_rules);
        }

        // 4. 原始文本规则
        if !provider.raw_rules.is_empty() {
            url = Self::apply_raw_rules(url, &provider.raw_rules);
        }

        ApplyOutcome::Cleaned(url)
    }

    fn matches_any(rules: &[&Regex], key: &str) -> bool {
        rules.iter().any(|rule| rule.is_match(key))
    }

    /// 移除命中规则的查询参数，保持剩余参数的相对顺序；空查询串连同 `?` 一起移除
    fn clean_query(url: &mut Url, rules: &[&Regex]) {
        match url.query() {
            None => return,
            Some("") => {
                url.set_query(None);
                return;
            }
            Some(_) => {}
        }

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let total = pairs.len();
        let kept: Vec<(String, String)> = pairs
            .into_iter()
            .filter(|(key, _)| !Self::matches_any(rules, key))
            .collect();

        if kept.len() == total {
            return;
        }
        debug!("移除查询参数 {} 个", total - kept.len());

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(&kept);
        }
    }

    /// 移除命中规则的片段参数，片段清空时连同 `#` 一起移除
    fn clean_fragment(url: &mut Url, rules: &[&Regex]) {
        let Some(fragment) = url.fragment() else {
            return;
        };

        let mut params = FragmentParams::parse(fragment);
        let removed = params.retain_keys(|key| !Self::matches_any(rules, key));
        if removed > 0 {
            debug!("移除片段参数 {} 个", removed);
        }

        if params.is_empty() {
            url.set_fragment(None);
        } else {
            url.set_fragment(Some(&params.to_string()));
        }
    }

    /// 依次对整条URL执行原始规则，结果无法解析时放弃全部原始规则的修改
    fn apply_raw_rules(url: Url, raw_rules: &[Regex]) -> Url {
        let mut cleaned = url.as_str().to_string();
        for rule in raw_rules {
            cleaned = rule.replace_all(&cleaned, "").into_owned();
        }

        match Url::parse(&cleaned) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("原始规则产生了无效URL，已忽略：{}（{}）", cleaned, e);
                url
            }
        }
    }
}
