//! 自定义规则叠加
//! 上游规则更新较慢，部分站点的新跟踪参数在此补充
//! 每次读取时重新计算，不写回缓存

use tracing::debug;

use super::model::RuleSet;

/// 需补充参数规则的站点（名称不区分大小写）
pub const CUSTOM_RULES: &[(&str, &[&str])] = &[
    ("YouTube", &["si", "pp", "source_ve_path"]),
    ("Twitter", &["s", "t", "ref_src", "ref_url"]),
];

/// 在规则库副本上叠加自定义参数规则（与上游已有规则去重）
pub fn apply_custom_rules(base: &RuleSet) -> RuleSet {
    let mut merged = base.clone();

    for (provider_name, extra_rules) in CUSTOM_RULES {
        // 上游不存在的站点不凭空创建
        let Some(provider) = merged
            .providers
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(provider_name))
            .map(|(_, provider)| provider)
        else {
            continue;
        };

        let mut added = 0;
        for rule in extra_rules.iter() {
            if !provider.rules.iter().any(|existing| existing.as_str() == *rule) {
                provider.rules.push(rule.to_string());
                added += 1;
            }
        }
        if added > 0 {
            debug!("站点 {} 叠加自定义参数规则 {} 条", provider_name, added);
        }
    }

    merged
}
