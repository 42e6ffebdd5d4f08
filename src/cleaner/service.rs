//! 净化服务：规则提供者 + 编译缓存 + 净化器
//! 每次请求都向规则提供者取一次规则；规则版本（哈希）不变时复用已编译的规则

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use super::engine::{CleanOutcome, CleanerOptions, UrlCleaner};
use crate::compiler::{CompiledRuleSet, RuleCompiler};
use crate::config::GlobalConfig;
use crate::error::RcuResult;
use crate::rule::{FileRuleStore, RuleSetProvider, RuleStore};
use crate::utils::{Clock, HttpClient, ReqwestHttpClient, SystemClock};

/// ClearURLs 净化服务
pub struct ClearUrls {
    provider: RuleSetProvider,
    http: Arc<dyn HttpClient>,
    options: CleanerOptions,
    // (规则哈希, 编译结果)
    compiled: RwLock<Option<(String, Arc<CompiledRuleSet>)>>,
}

impl ClearUrls {
    /// 按配置创建：reqwest 客户端 + 本地文件缓存 + 系统时钟
    pub fn new(config: &GlobalConfig) -> RcuResult<Self> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(Duration::from_secs(config.http_timeout))?);
        let store: Arc<dyn RuleStore> = Arc::new(FileRuleStore::new(config.rule_cache_dir.clone()));
        Ok(Self::with_parts(config, store, http, Arc::new(SystemClock)))
    }

    /// 注入存储、网络与时钟
    pub fn with_parts(
        config: &GlobalConfig,
        store: Arc<dyn RuleStore>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider: RuleSetProvider::new(config, store, http.clone(), clock),
            http,
            options: CleanerOptions::from(config),
            compiled: RwLock::new(None),
        }
    }

    pub fn rule_provider(&self) -> &RuleSetProvider {
        &self.provider
    }

    /// 获取当前规则版本对应的净化器
    pub async fn cleaner(&self) -> RcuResult<UrlCleaner> {
        let snapshot = self.provider.get_snapshot().await?;

        if let Some((hash, compiled)) = self.compiled.read().await.as_ref() {
            if *hash == snapshot.hash {
                return Ok(self.build_cleaner(compiled.clone()));
            }
        }

        debug!("规则版本变化，重新编译：{}", snapshot.hash);
        let compiled = Arc::new(RuleCompiler::compile(&snapshot.rule_set));
        *self.compiled.write().await = Some((snapshot.hash, compiled.clone()));
        Ok(self.build_cleaner(compiled))
    }

    /// 净化URL；仅在规则完全不可用时报错
    pub async fn clean(&self, input: &str) -> RcuResult<String> {
        Ok(self.cleaner().await?.clean_url(input).await)
    }

    /// 净化URL并返回结构化结果
    pub async fn clean_outcome(&self, input: &str) -> RcuResult<CleanOutcome> {
        Ok(self.cleaner().await?.clean(input).await)
    }

    fn build_cleaner(&self, compiled: Arc<CompiledRuleSet>) -> UrlCleaner {
        UrlCleaner::new(compiled, self.http.clone(), self.options)
    }
}
