//! 规则加载管理器
//! 负责从本地缓存或远程拉取规则库：
//! 1. 缓存未过期直接使用，不发起网络请求
//! 2. 过期或缺失时并发拉取规则文档与哈希，SHA-256 校验通过后整体写入缓存
//! 3. 拉取失败时回退到过期缓存，仅在无任何缓存时报错
//! 4. 返回前叠加自定义规则，缓存中的数据保持原样

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::cache::{CacheMeta, CachedRuleSet, RuleStore};
use super::model::RuleSet;
use super::overlay::apply_custom_rules;
use crate::config::GlobalConfig;
use crate::error::{RcuResult, RsClearUrlsError};
use crate::utils::{Clock, HttpClient, HttpRequest, HttpResponse};

/// 规则缓存键
pub const RULES_CACHE_KEY: &str = "rules";

/// 规则库快照（已叠加自定义规则）
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub rule_set: RuleSet,
    // 上游规则文档的哈希，用于识别规则版本
    pub hash: String,
}

/// 计算文本的 SHA-256（小写十六进制）
pub fn compute_sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 规则提供者（进程内单一实例，存储/网络/时钟均可注入）
pub struct RuleSetProvider {
    store: Arc<dyn RuleStore>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    rules_url: String,
    hash_url: String,
    cache_ttl: Duration,
}

impl RuleSetProvider {
    pub fn new(
        config: &GlobalConfig,
        store: Arc<dyn RuleStore>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            http,
            clock,
            rules_url: config.rules_url.clone(),
            hash_url: config.hash_url.clone(),
            cache_ttl: config.cache_ttl,
        }
    }

    /// 获取规则库（优先本地缓存，缓存失效则拉取远程）
    pub async fn get_rules(&self) -> RcuResult<RuleSet> {
        Ok(self.get_snapshot().await?.rule_set)
    }

    /// 获取规则库及其版本哈希
    pub async fn get_snapshot(&self) -> RcuResult<RuleSnapshot> {
        let now = self.clock.now_millis();

        // 1. 优先使用未过期的缓存
        match self.store.get(RULES_CACHE_KEY).await {
            Ok(Some(cached)) if cached.is_fresh(now) => {
                debug!("使用本地缓存规则，哈希：{}", cached.hash);
                return Ok(Self::snapshot_of(&cached));
            }
            Ok(Some(_)) => debug!("本地缓存规则已过期"),
            Ok(None) => debug!("本地缓存规则不存在"),
            Err(e) => warn!("读取本地缓存规则失败：{}", e),
        }

        // 2. 拉取远程规则
        info!("拉取最新 ClearURLs 规则：{}", self.rules_url);
        match self.fetch_and_cache().await {
            Ok(cached) => Ok(Self::snapshot_of(&cached)),
            Err(e) => {
                warn!("拉取规则失败：{}", e);
                self.fallback(e).await
            }
        }
    }

    /// 忽略缓存有效期，强制拉取（失败直接返回错误）
    pub async fn force_refresh(&self) -> RcuResult<RuleSet> {
        let cached = self.fetch_and_cache().await?;
        Ok(Self::snapshot_of(&cached).rule_set)
    }

    /// 当前缓存的元信息
    pub async fn cached_meta(&self) -> RcuResult<Option<CacheMeta>> {
        Ok(self.store.get(RULES_CACHE_KEY).await?.map(|cached| cached.meta()))
    }

    /// 拉取失败时回退到任意已有缓存（即使已过期）
    async fn fallback(&self, cause: RsClearUrlsError) -> RcuResult<RuleSnapshot> {
        match self.store.get(RULES_CACHE_KEY).await {
            Ok(Some(cached)) => {
                warn!("回退到过期的缓存规则，哈希：{}", cached.hash);
                Ok(Self::snapshot_of(&cached))
            }
            Ok(None) => Err(RsClearUrlsError::RulesUnavailable(cause.to_string())),
            Err(e) => Err(RsClearUrlsError::RulesUnavailable(format!("{}；读取缓存失败：{}", cause, e))),
        }
    }

    /// 拉取、校验并缓存规则
    async fn fetch_and_cache(&self) -> RcuResult<CachedRuleSet> {
        // 规则文档与哈希互不依赖，并发拉取
        let (rules_response, hash_response) = tokio::join!(
            self.http.execute(HttpRequest::get(self.rules_url.as_str())),
            self.http.execute(HttpRequest::get(self.hash_url.as_str())),
        );
        let rules_text = Self::successful_body(rules_response?, "规则文档", &self.rules_url)?;
        let expected_hash = Self::successful_body(hash_response?, "规则哈希", &self.hash_url)?;

        // 完整性校验
        let actual_hash = compute_sha256_hex(&rules_text);
        let expected_hash = expected_hash.trim();
        if actual_hash != expected_hash {
            return Err(RsClearUrlsError::HashMismatch {
                expected: expected_hash.to_string(),
                actual: actual_hash,
            });
        }

        let data = RuleSet::from_json(&rules_text)?;
        let now = self.clock.now_millis();
        let cached = CachedRuleSet {
            data,
            hash: actual_hash,
            cached_at: now,
            expires_at: now.saturating_add(self.cache_ttl.as_millis() as u64),
        };

        // 写缓存失败不影响本次使用已校验的规则
        if let Err(e) = self.store.put(RULES_CACHE_KEY, &cached).await {
            warn!("规则缓存写入失败：{}", e);
        } else {
            info!("已缓存规则，哈希：{}，站点规则数：{}", cached.hash, cached.data.providers.len());
        }

        Ok(cached)
    }

    fn successful_body(response: HttpResponse, what: &str, url: &str) -> RcuResult<String> {
        if !response.is_success() {
            return Err(RsClearUrlsError::RuleFetchError(format!(
                "{} URL {} 返回状态码 {}",
                what, url, response.status
            )));
        }
        Ok(response.body)
    }

    fn snapshot_of(cached: &CachedRuleSet) -> RuleSnapshot {
        RuleSnapshot {
            rule_set: apply_custom_rules(&cached.data),
            hash: cached.hash.clone(),
        }
    }
}
