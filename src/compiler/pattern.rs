//! 编译后模式模型
//! 正则编译后的结构

use std::fmt;
use regex::Regex;

/// 规则字段类型（用于编译统计与跳过记录）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    UrlPattern,
    Rule,
    RawRule,
    ReferralMarketing,
    Exception,
    Redirection,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternKind::UrlPattern => "urlPattern",
            PatternKind::Rule => "rules",
            PatternKind::RawRule => "rawRules",
            PatternKind::ReferralMarketing => "referralMarketing",
            PatternKind::Exception => "exceptions",
            PatternKind::Redirection => "redirections",
        };
        f.write_str(name)
    }
}

/// 编译失败、被永久跳过的正则
#[derive(Debug, Clone)]
pub struct SkippedPattern {
    pub provider: String,
    pub kind: PatternKind,
    pub pattern: String,
    pub reason: String,
}

/// 站点编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledProvider {
    pub name: String,
    // None 表示 urlPattern 无效，该站点永不命中
    pub url_pattern: Option<Regex>,
    pub complete_provider: bool,
    pub rules: Vec<Regex>,
    pub referral_marketing: Vec<Regex>,
    pub raw_rules: Vec<Regex>,
    pub exceptions: Vec<Regex>,
    pub redirections: Vec<Regex>,
    pub force_redirection: bool,
}

impl CompiledProvider {
    /// 判断URL是否命中任一例外规则
    pub fn is_exception(&self, url: &str) -> bool {
        self.exceptions.iter().any(|regex| regex.is_match(url))
    }
}

/// 编译后的规则库
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    // 按声明顺序排列，不含兜底规则
    pub providers: Vec<CompiledProvider>,
    pub global: Option<CompiledProvider>,
    pub skipped: Vec<SkippedPattern>,
}

impl CompiledRuleSet {
    /// 站点规则总数（含兜底规则）
    pub fn len(&self) -> usize {
        self.providers.len() + usize::from(self.global.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
