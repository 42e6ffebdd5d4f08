//! 全局净化服务单例管理
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::service::ClearUrls;
use crate::error::{RcuResult, RsClearUrlsError};
use crate::config::{ConfigManager, GlobalConfig};

/// 全局净化服务实例
static GLOBAL_CLEANER: Lazy<Arc<OnceCell<ClearUrls>>> = Lazy::new(|| {
    Arc::new(OnceCell::new())
});

/// 初始化全局净化服务（默认配置）
pub async fn init_clearurls() -> RcuResult<()> {
    init_clearurls_with_config(ConfigManager::get_default()).await
}

/// 带自定义配置初始化全局净化服务（重复初始化时保留第一次的实例）
pub async fn init_clearurls_with_config(config: GlobalConfig) -> RcuResult<()> {
    GLOBAL_CLEANER
        .get_or_try_init(|| async { ClearUrls::new(&config) })
        .await?;
    Ok(())
}

/// 获取全局净化服务
pub fn get_global_cleaner() -> RcuResult<&'static ClearUrls> {
    GLOBAL_CLEANER.get()
        .ok_or(RsClearUrlsError::CleanerNotInitialized)
}

/// 使用全局净化服务净化URL
pub async fn clean_url_global(input: &str) -> RcuResult<String> {
    get_global_cleaner()?.clean(input).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uninitialized_global_cleaner_is_an_error() {
        assert!(matches!(get_global_cleaner(), Err(RsClearUrlsError::CleanerNotInitialized)));
        assert!(matches!(
            clean_url_global("https://example.com/?utm_source=x").await,
            Err(RsClearUrlsError::CleanerNotInitialized)
        ));
    }
}
