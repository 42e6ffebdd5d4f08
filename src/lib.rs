//! rsclearurls - 基于 ClearURLs 规则的 URL 跟踪参数净化工具

// 导出全局错误类型
pub use self::error::{RsClearUrlsError, RcuResult};

// 导出配置模块
pub use self::config::{GlobalConfig, ConfigManager, CustomConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{
    Provider, RuleSet, RuleSetProvider, RuleSnapshot, RuleStore,
    CachedRuleSet, CacheMeta, FileRuleStore, MemoryRuleStore, apply_custom_rules
};

// 导出工具模块核心接口
pub use self::utils::{
    Clock, SystemClock, HttpClient, ReqwestHttpClient, HeaderConverter, FragmentParams
};

// 导出编译模块核心接口
pub use self::compiler::{
    CompiledProvider, CompiledRuleSet, RuleCompiler, SkippedPattern
};

// 导出净化模块核心接口（含便捷的全局接口）
pub use self::cleaner::{
    ClearUrls,
    UrlCleaner,
    CleanerOptions,
    CleanOutcome,
    clean_url,
    init_clearurls,
    init_clearurls_with_config,
    get_global_cleaner,
    clean_url_global,
};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod utils;
pub mod compiler;
pub mod cleaner;

#[cfg(test)]
mod test_support;
