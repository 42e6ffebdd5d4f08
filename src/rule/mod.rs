//! 规则模块：负责规则的加载、缓存、自定义叠加、数据模型定义
pub mod model;
pub mod cache;
pub mod overlay;
pub mod loader;

// 导出核心接口
pub use self::model::{Provider, RuleSet, GLOBAL_RULES_NAME};
pub use self::cache::{CacheMeta, CachedRuleSet, FileRuleStore, MemoryRuleStore, RuleStore};
pub use self::overlay::{apply_custom_rules, CUSTOM_RULES};
pub use self::loader::{compute_sha256_hex, RuleSetProvider, RuleSnapshot, RULES_CACHE_KEY};
