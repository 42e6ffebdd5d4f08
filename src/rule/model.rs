//! 规则数据模型定义
//! 仅存储规则数据，无任何业务逻辑，支持序列化/反序列化

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::RcuResult;

/// 兜底规则的保留名称
pub const GLOBAL_RULES_NAME: &str = "globalRules";

/// 单个站点规则（从 ClearURLs JSON 解析）
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub url_pattern: String,
    // 命中即拦截，而非净化
    #[serde(default)]
    pub complete_provider: bool,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub raw_rules: Vec<String>,
    #[serde(default)]
    pub referral_marketing: Vec<String>,
    #[serde(default)]
    pub exceptions: Vec<String>,
    #[serde(default)]
    pub redirections: Vec<String>,
    // 保留字段，当前不参与任何逻辑
    #[serde(default)]
    pub force_redirection: bool,
}

impl Provider {
    /// 以URL匹配模式快速创建（其余字段为默认值）
    pub fn with_pattern(url_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            ..Default::default()
        }
    }
}

/// 完整规则库（保持上游声明顺序）
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RuleSet {
    pub providers: IndexMap<String, Provider>,
}

impl RuleSet {
    /// 从规则文档文本解析
    pub fn from_json(text: &str) -> RcuResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 兜底规则
    pub fn global(&self) -> Option<&Provider> {
        self.providers.get(GLOBAL_RULES_NAME)
    }

    /// 按声明顺序遍历站点规则（不含兜底规则）
    pub fn ordered_providers(&self) -> impl Iterator<Item = (&String, &Provider)> {
        self.providers
            .iter()
            .filter(|(name, _)| name.as_str() != GLOBAL_RULES_NAME)
    }
}
