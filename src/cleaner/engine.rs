//! 净化流程编排
//! 先完整解析跳转链，再对最终URL匹配站点并应用规则
//! 跳转链以显式循环 + 已访问集合实现，访问不同URL的数量受 max_redirects 限制

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use super::applicator::{ApplyOutcome, RuleApplicator};
use super::matcher::ProviderMatcher;
use super::redirect::RedirectResolver;
use crate::compiler::{CompiledRuleSet, RuleCompiler};
use crate::config::{GlobalConfig, DEFAULT_MAX_REDIRECTS};
use crate::error::RcuResult;
use crate::rule::RuleSet;
use crate::utils::{HttpClient, ReqwestHttpClient};

/// 净化选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanerOptions {
    pub max_redirects: usize,
    pub follow_http_redirects: bool,
    pub strip_referral_marketing: bool,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            follow_http_redirects: true,
            strip_referral_marketing: false,
        }
    }
}

impl From<&GlobalConfig> for CleanerOptions {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            max_redirects: config.max_redirects,
            follow_http_redirects: config.follow_http_redirects,
            strip_referral_marketing: config.strip_referral_marketing,
        }
    }
}

/// 净化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
    Cleaned(String),
    // 命中整站拦截规则，url 为跳转解析后的最终地址
    Blocked { url: String, provider: String },
    // 处理失败，调用方应使用原始输入
    Unchanged { reason: String },
}

impl CleanOutcome {
    /// 转为最终URL：拦截或失败时返回原始输入
    pub fn into_url_or(self, original: &str) -> String {
        match self {
            CleanOutcome::Cleaned(url) => url,
            CleanOutcome::Blocked { .. } | CleanOutcome::Unchanged { .. } => original.to_string(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, CleanOutcome::Blocked { .. })
    }
}

/// URL净化器（持有一份已编译规则，可重复使用）
#[derive(Clone)]
pub struct UrlCleaner {
    rules: Arc<CompiledRuleSet>,
    resolver: RedirectResolver,
    options: CleanerOptions,
}

impl UrlCleaner {
    pub fn new(rules: Arc<CompiledRuleSet>, http: Arc<dyn HttpClient>, options: CleanerOptions) -> Self {
        let resolver = if options.follow_http_redirects {
            RedirectResolver::new(http)
        } else {
            RedirectResolver::offline()
        };
        Self { rules, resolver, options }
    }

    /// 不发起任何网络请求的净化器
    pub fn offline(rules: Arc<CompiledRuleSet>, options: CleanerOptions) -> Self {
        Self {
            rules,
            resolver: RedirectResolver::offline(),
            options: CleanerOptions {
                follow_http_redirects: false,
                ..options
            },
        }
    }

    pub fn rules(&self) -> &CompiledRuleSet {
        &self.rules
    }

    pub fn options(&self) -> CleanerOptions {
        self.options
    }

    /// 净化URL，返回结构化结果
    pub async fn clean(&self, input: &str) -> CleanOutcome {
        match self.try_clean(input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("净化URL失败，返回原始输入：{}（{}）", input, e);
                CleanOutcome::Unchanged { reason: e.to_string() }
            }
        }
    }

    /// 净化URL，任何失败（含拦截）都返回原始输入，从不报错
    pub async fn clean_url(&self, input: &str) -> String {
        self.clean(input).await.into_url_or(input)
    }

    async fn try_clean(&self, input: &str) -> RcuResult<CleanOutcome> {
        let mut current = Url::parse(input)?;
        let mut visited: HashSet<String> = HashSet::new();

        loop {
            if visited.contains(current.as_str()) || visited.len() >= self.options.max_redirects {
                debug!("跳转链终止（已访问{}个URL）：{}", visited.len(), current);
                break;
            }
            visited.insert(current.as_str().to_string());

            match self.resolver.resolve(&current, &self.rules).await? {
                Some(target) if target != current.as_str() => {
                    debug!("跳转：{} -> {}", current, target);
                    current = Url::parse(&target)?;
                }
                _ => break,
            }
        }

        Ok(self.apply_rules(current))
    }

    /// 不解析跳转，直接对URL应用规则
    pub fn apply_rules(&self, url: Url) -> CleanOutcome {
        let Some(provider) = ProviderMatcher::find(&self.rules, url.as_str()) else {
            return CleanOutcome::Cleaned(url.to_string());
        };

        let final_url = url.to_string();
        match RuleApplicator::apply(url, provider, self.options.strip_referral_marketing) {
            ApplyOutcome::Cleaned(cleaned) => CleanOutcome::Cleaned(cleaned.to_string()),
            ApplyOutcome::Blocked => {
                debug!("链接被站点 {} 整站拦截：{}", provider.name, final_url);
                CleanOutcome::Blocked {
                    url: final_url,
                    provider: provider.name.clone(),
                }
            }
        }
    }
}

/// 便捷接口：编译规则并净化单个URL（使用默认 HTTP 客户端）
pub async fn clean_url(input: &str, rule_set: &RuleSet, max_redirects: usize) -> String {
    let rules = Arc::new(RuleCompiler::compile(rule_set));
    let options = CleanerOptions {
        max_redirects,
        ..CleanerOptions::default()
    };

    let cleaner = match ReqwestHttpClient::new(Duration::from_secs(GlobalConfig::default().http_timeout)) {
        Ok(http) => UrlCleaner::new(rules, Arc::new(http), options),
        Err(e) => {
            warn!("HTTP 客户端创建失败，仅解析规则声明的跳转：{}", e);
            UrlCleaner::offline(rules, options)
        }
    };

    cleaner.clean_url(input).await
}
