//! 净化模块：跳转解析、站点匹配、规则应用与服务封装
pub mod matcher;
pub mod applicator;
pub mod redirect;
pub mod engine;
pub mod service;
pub mod global;

// 导出核心接口
pub use self::matcher::ProviderMatcher;
pub use self::applicator::{ApplyOutcome, RuleApplicator};
pub use self::redirect::RedirectResolver;
pub use self::engine::{clean_url, CleanOutcome, CleanerOptions, UrlCleaner};
pub use self::service::ClearUrls;
pub use self::global::{clean_url_global, get_global_cleaner, init_clearurls, init_clearurls_with_config};
