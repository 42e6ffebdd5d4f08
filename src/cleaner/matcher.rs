//! 站点匹配：按声明顺序线性扫描，首个命中者胜出，均未命中时使用兜底规则

use crate::compiler::{CompiledProvider, CompiledRuleSet};

/// 站点匹配器
pub struct ProviderMatcher;

impl ProviderMatcher {
    /// 为URL选择站点规则（兜底规则本身不做模式匹配）
    pub fn find<'a>(rules: &'a CompiledRuleSet, url: &str) -> Option<&'a CompiledProvider> {
        rules
            .providers
            .iter()
            .find(|provider| {
                provider
                    .url_pattern
                    .as_ref()
                    .is_some_and(|pattern| pattern.is_match(url))
            })
            .or(rules.global.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleCompiler;
    use crate::rule::RuleSet;

    fn compile(json: &str) -> CompiledRuleSet {
        RuleCompiler::compile(&RuleSet::from_json(json).unwrap())
    }

    #[test]
    fn test_first_declared_provider_wins() {
        let rules = compile(r#"{ "providers": {
            "Broad": { "urlPattern": "example\\.com" },
            "Narrow": { "urlPattern": "^https://shop\\.example\\.com" },
            "globalRules": { "urlPattern": ".*" }
        } }"#);

        let matched = ProviderMatcher::find(&rules, "https://shop.example.com/item").unwrap();
        assert_eq!(matched.name, "Broad");
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let rules = compile(r#"{ "providers": {
            "Broken": { "urlPattern": "(example" },
            "Valid": { "urlPattern": "example" },
            "globalRules": { "urlPattern": "never-tested" }
        } }"#);

        assert_eq!(ProviderMatcher::find(&rules, "https://example.org").unwrap().name, "Valid");
    }

    #[test]
    fn test_global_fallback_is_unconditional() {
        let rules = compile(r#"{ "providers": {
            "Shop": { "urlPattern": "shop" },
            "globalRules": { "urlPattern": "pattern-that-never-matches" }
        } }"#);

        let matched = ProviderMatcher::find(&rules, "https://news.example/").unwrap();
        assert_eq!(matched.name, "globalRules");
    }

    #[test]
    fn test_no_global_rules_yields_none() {
        let rules = compile(r#"{ "providers": { "Shop": { "urlPattern": "shop" } } }"#);
        assert!(ProviderMatcher::find(&rules, "https://news.example/").is_none());
    }
}
