//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;
use std::time::Duration;

/// ClearURLs 官方规则文档地址
pub const DEFAULT_RULES_URL: &str = "https://rules2.clearurls.xyz/data.minify.json";
/// ClearURLs 官方规则哈希地址
pub const DEFAULT_HASH_URL: &str = "https://rules2.clearurls.xyz/rules.minify.hash";
/// 规则缓存有效期：7天
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// 默认最多访问的不同URL数
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 规则文档URL
    pub rules_url: String,
    // 规则哈希URL
    pub hash_url: String,
    // 规则缓存目录
    pub rule_cache_dir: PathBuf,
    // 规则缓存有效期
    pub cache_ttl: Duration,
    // 超时配置（单位：秒）
    pub http_timeout: u64,
    // 跳转追踪上限
    pub max_redirects: usize,
    // 是否探测真实HTTP跳转
    pub follow_http_redirects: bool,
    // 是否同时移除推广返利参数（referralMarketing）
    pub strip_referral_marketing: bool,
    // 是否启用详细日志
    pub verbose: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            rules_url: DEFAULT_RULES_URL.to_string(),
            hash_url: DEFAULT_HASH_URL.to_string(),
            rule_cache_dir: PathBuf::from(".cache/rsclearurls"),
            cache_ttl: DEFAULT_CACHE_TTL,
            http_timeout: 30,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            follow_http_redirects: true,
            strip_referral_marketing: false,
            verbose: false,
        }
    }
}

/// 配置管理器（单例）
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GlobalConfig::default(),
        }
    }

    pub fn rules_url(mut self, url: impl Into<String>) -> Self {
        self.config.rules_url = url.into();
        self
    }

    pub fn hash_url(mut self, url: impl Into<String>) -> Self {
        self.config.hash_url = url.into();
        self
    }

    pub fn rule_cache_dir(mut self, path: PathBuf) -> Self {
        self.config.rule_cache_dir = path;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    pub fn follow_http_redirects(mut self, follow: bool) -> Self {
        self.config.follow_http_redirects = follow;
        self
    }

    pub fn strip_referral_marketing(mut self, strip: bool) -> Self {
        self.config.strip_referral_marketing = strip;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = ConfigManager::custom()
            .max_redirects(2)
            .http_timeout(5)
            .follow_http_redirects(false)
            .rule_cache_dir(PathBuf::from("/tmp/rsclearurls"))
            .build();

        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.http_timeout, 5);
        assert!(!config.follow_http_redirects);
        assert_eq!(config.rule_cache_dir, PathBuf::from("/tmp/rsclearurls"));
        // 未覆盖的项保持默认
        assert_eq!(config.rules_url, DEFAULT_RULES_URL);
        assert_eq!(config.cache_ttl, DEFAULT_CACHE_TTL);
    }
}
