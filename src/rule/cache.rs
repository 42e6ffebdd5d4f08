//! 规则缓存管理
//! 缓存记录整体替换，读取方只会看到旧记录或新记录，不会看到写了一半的数据

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rmp_serde::{from_slice, to_vec_named};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::debug;

use super::model::RuleSet;
use crate::error::{RcuResult, RsClearUrlsError};

/// 缓存的规则记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRuleSet {
    pub data: RuleSet,
    pub hash: String,
    // 毫秒时间戳
    pub cached_at: u64,
    pub expires_at: u64,
}

impl CachedRuleSet {
    pub fn is_fresh(&self, now_millis: u64) -> bool {
        now_millis < self.expires_at
    }

    /// 缓存元信息（不含规则数据）
    pub fn meta(&self) -> CacheMeta {
        CacheMeta {
            hash: self.hash.clone(),
            cached_at: self.cached_at,
            expires_at: self.expires_at,
        }
    }
}

/// 缓存元信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMeta {
    pub hash: String,
    pub cached_at: u64,
    pub expires_at: u64,
}

/// 持久化键值存储（put 需保证整体替换）
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get(&self, key: &str) -> RcuResult<Option<CachedRuleSet>>;
    async fn put(&self, key: &str, value: &CachedRuleSet) -> RcuResult<()>;
}

/// 内存存储（进程内单例或测试使用）
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    entries: RwLock<HashMap<String, Arc<CachedRuleSet>>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get(&self, key: &str) -> RcuResult<Option<CachedRuleSet>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|cached| cached.as_ref().clone()))
    }

    async fn put(&self, key: &str, value: &CachedRuleSet) -> RcuResult<()> {
        let record = Arc::new(value.clone());
        self.entries.write().await.insert(key.to_string(), record);
        Ok(())
    }
}

/// 本地文件存储（MessagePack），先写临时文件再重命名
#[derive(Debug, Clone)]
pub struct FileRuleStore {
    cache_dir: PathBuf,
}

impl FileRuleStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.mp", key))
    }

    /// 清除本地缓存
    pub async fn clear(&self, key: &str) -> RcuResult<()> {
        let cache_path = self.path_for(key);
        if tokio::fs::try_exists(&cache_path).await? {
            tokio::fs::remove_file(cache_path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for FileRuleStore {
    async fn get(&self, key: &str) -> RcuResult<Option<CachedRuleSet>> {
        let cache_path = self.path_for(key);
        let cache_data = match tokio::fs::read(&cache_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // MessagePack反序列化
        let cached: CachedRuleSet = from_slice(&cache_data)
            .map_err(|e| RsClearUrlsError::MsgPackError(format!("反序列化失败：{}", e)))?;

        debug!("缓存文件反序列化成功，站点规则数：{}，哈希：{}", cached.data.providers.len(), cached.hash);
        Ok(Some(cached))
    }

    async fn put(&self, key: &str, value: &CachedRuleSet) -> RcuResult<()> {
        // MessagePack序列化（带字段名，兼容可选字段）
        let cache_data = to_vec_named(value)
            .map_err(|e| RsClearUrlsError::MsgPackError(format!("序列化失败：{}", e)))?;

        debug!("规则缓存序列化成功，序列化后数据大小：{} 字节", cache_data.len());

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let cache_dir = self.cache_dir.clone();
        let cache_path = self.path_for(key);

        // 每次写入使用独立的临时文件，并发写入互不干扰
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = NamedTempFile::new_in(&cache_dir)?;
            tmp.write_all(&cache_data)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&cache_path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(())
    }
}
