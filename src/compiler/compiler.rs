//! 规则编译器核心
//! 仅负责将原始规则编译为可执行的正则模式
//! 无效正则在加载时记录为跳过项，不在每次请求时重复尝试

use std::time::Instant;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::pattern::{CompiledProvider, CompiledRuleSet, PatternKind, SkippedPattern};
use crate::rule::{Provider, RuleSet, GLOBAL_RULES_NAME};

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译规则库（从不失败，无效正则仅记录）
    pub fn compile(rule_set: &RuleSet) -> CompiledRuleSet {
        let start = Instant::now();
        let mut stats = CompileStats::default();
        let mut skipped = Vec::new();

        // 1. 按声明顺序编译站点规则
        let providers = rule_set
            .ordered_providers()
            .map(|(name, provider)| Self::compile_provider(name, provider, &mut stats, &mut skipped))
            .collect();

        // 2. 编译兜底规则
        let global = rule_set
            .global()
            .map(|provider| Self::compile_provider(GLOBAL_RULES_NAME, provider, &mut stats, &mut skipped));
        if global.is_none() {
            warn!("规则库缺少 {} 兜底规则，未命中站点的URL将原样返回", GLOBAL_RULES_NAME);
        }

        // 3. 输出编译统计
        debug!("规则编译完成，总耗时{:?}", start.elapsed());
        debug!(
            "编译统计：站点{}个、参数规则{}条、原始规则{}条、例外规则{}条、跳转规则{}条、跳过{}条",
            stats.provider_count,
            stats.rule_count,
            stats.raw_rule_count,
            stats.exception_count,
            stats.redirection_count,
            skipped.len()
        );

        CompiledRuleSet {
            providers,
            global,
            skipped,
        }
    }

    /// 编译单个站点规则
    fn compile_provider(
        name: &str,
        provider: &Provider,
        stats: &mut CompileStats,
        skipped: &mut Vec<SkippedPattern>,
    ) -> CompiledProvider {
        stats.provider_count += 1;
        let mut ctx = ProviderContext { name, stats, skipped };

        // urlPattern 按原样区分大小写
        let url_pattern = ctx.compile(PatternKind::UrlPattern, &provider.url_pattern, &provider.url_pattern, false);

        // 参数规则需整键匹配
        let rules = ctx.compile_anchored(PatternKind::Rule, &provider.rules);
        let referral_marketing = ctx.compile_anchored(PatternKind::ReferralMarketing, &provider.referral_marketing);
        let raw_rules = ctx.compile_list(PatternKind::RawRule, &provider.raw_rules);
        let exceptions = ctx.compile_list(PatternKind::Exception, &provider.exceptions);
        let redirections = ctx.compile_list(PatternKind::Redirection, &provider.redirections);

        CompiledProvider {
            name: name.to_string(),
            url_pattern,
            complete_provider: provider.complete_provider,
            rules,
            referral_marketing,
            raw_rules,
            exceptions,
            redirections,
            force_redirection: provider.force_redirection,
        }
    }
}

/// 单个站点的编译上下文
struct ProviderContext<'a> {
    name: &'a str,
    stats: &'a mut CompileStats,
    skipped: &'a mut Vec<SkippedPattern>,
}

impl ProviderContext<'_> {
    /// 编译 `^rule$` 形式的参数规则（忽略大小写）
    fn compile_anchored(&mut self, kind: PatternKind, raw_patterns: &[String]) -> Vec<Regex> {
        raw_patterns
            .iter()
            .filter_map(|raw| self.compile(kind, raw, &format!("^{}$", raw), true))
            .collect()
    }

    /// 编译列表型模式（忽略大小写）
    fn compile_list(&mut self, kind: PatternKind, raw_patterns: &[String]) -> Vec<Regex> {
        raw_patterns
            .iter()
            .filter_map(|raw| self.compile(kind, raw, raw, true))
            .collect()
    }

    /// 编译单个正则，失败时记录跳过项
    fn compile(&mut self, kind: PatternKind, raw: &str, source: &str, case_insensitive: bool) -> Option<Regex> {
        match RegexBuilder::new(source).case_insensitive(case_insensitive).build() {
            Ok(regex) => {
                self.stats.record(kind);
                Some(regex)
            }
            Err(e) => {
                warn!("站点 {} 的 {} 正则无效，已跳过：{}（{}）", self.name, kind, raw, e);
                self.skipped.push(SkippedPattern {
                    provider: self.name.to_string(),
                    kind,
                    pattern: raw.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
struct CompileStats {
    provider_count: usize,
    rule_count: usize,
    raw_rule_count: usize,
    exception_count: usize,
    redirection_count: usize,
}

impl CompileStats {
    fn record(&mut self, kind: PatternKind) {
        match kind {
            PatternKind::Rule | PatternKind::ReferralMarketing => self.rule_count += 1,
            PatternKind::RawRule => self.raw_rule_count += 1,
            PatternKind::Exception => self.exception_count += 1,
            PatternKind::Redirection => self.redirection_count += 1,
            PatternKind::UrlPattern => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_set(json: &str) -> RuleSet {
        RuleSet::from_json(json).unwrap()
    }

    #[test]
    fn test_invalid_patterns_are_recorded_not_fatal() {
        let rules = rule_set(r#"{ "providers": {
            "Broken": { "urlPattern": "(unclosed", "rules": ["ok", "(?=lookahead)"] },
            "globalRules": { "urlPattern": ".*", "rawRules": ["[bad"], "exceptions": ["fine"] }
        } }"#);

        let compiled = RuleCompiler::compile(&rules);
        let broken = &compiled.providers[0];
        assert!(broken.url_pattern.is_none());
        assert_eq!(broken.rules.len(), 1);

        let global = compiled.global.as_ref().unwrap();
        assert!(global.raw_rules.is_empty());
        assert_eq!(global.exceptions.len(), 1);

        let kinds: Vec<PatternKind> = compiled.skipped.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![PatternKind::UrlPattern, PatternKind::Rule, PatternKind::RawRule]);
        assert_eq!(compiled.skipped[0].provider, "Broken");
    }

    #[test]
    fn test_rules_are_anchored_and_case_insensitive() {
        let rules = rule_set(r#"{ "providers": {
            "globalRules": { "urlPattern": ".*", "rules": ["utm_[a-z]+"] }
        } }"#);

        let compiled = RuleCompiler::compile(&rules);
        let rule = &compiled.global.as_ref().unwrap().rules[0];
        assert!(rule.is_match("UTM_Source"));
        assert!(!rule.is_match("x_utm_source"));
        assert!(!rule.is_match("utm_source1"));
    }

    #[test]
    fn test_url_pattern_stays_case_sensitive() {
        let rules = rule_set(r#"{ "providers": {
            "Shop": { "urlPattern": "shop\\.example" }
        } }"#);

        let compiled = RuleCompiler::compile(&rules);
        let pattern = compiled.providers[0].url_pattern.as_ref().unwrap();
        assert!(pattern.is_match("https://shop.example/item"));
        assert!(!pattern.is_match("https://SHOP.EXAMPLE/item"));
        assert!(compiled.global.is_none());
        assert_eq!(compiled.len(), 1);
    }
}
