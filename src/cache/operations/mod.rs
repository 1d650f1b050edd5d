//! 缓存操作
//!
//! [`ResponseCache`] 不会让调用方失败：后端错误只记录日志，
//! 读取按未命中处理，写入返回 `false`。

use std::future::Future;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::keys::memo_key;
use crate::cache::store::{CacheError, CacheStore, RedisStore};
use crate::config::Config;

#[derive(Clone)]
pub struct ResponseCache {
    store: Option<Arc<dyn CacheStore>>,
}

impl ResponseCache {
    /// 无后端：每次读取都未命中，写入均报告失败
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    /// 启动时决定一次是否启用缓存。未设置 `REDIS_URL` 或启动时连不上后端，
    /// 则整个进程生命周期内都不启用。
    pub async fn from_config(config: &Config) -> Self {
        let Some(url) = config.redis_url.as_deref() else {
            info!("Redis cache disabled - REDIS_URL not set");
            return Self::disabled();
        };

        match RedisStore::connect(url, config.cache_timeout()).await {
            Ok(store) => {
                info!("Redis cache enabled");
                Self::with_store(Arc::new(store))
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize Redis, caching disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.get_as(key).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        let raw = match store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "cache miss");
                return None;
            }
            Err(e) => {
                error!(error = %e, key = %key, "Redis get error");
                return None;
            }
        };

        match serde_json::from_str(&raw).map_err(CacheError::from) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(error = %e, key = %key, "discarding unreadable cache entry");
                None
            }
        }
    }

    pub async fn set<T>(&self, key: &str, value: &T, ttl_secs: u64) -> bool
    where
        T: Serialize + ?Sized,
    {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, key = %key, "value is not cacheable");
                return false;
            }
        };

        match store.set(key, json, ttl_secs).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, key = %key, "Redis set error");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        match store.delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                error!(error = %e, key = %key, "Redis delete error");
                false
            }
        }
    }

    /// `(operation, args)` 已有缓存时直接返回，否则执行 `compute`。
    ///
    /// 只缓存 `Ok` 结果。同一键的并发未命中可能各自计算，以最后一次写入为准。
    pub async fn memoize<A, T, E, F, Fut>(
        &self,
        operation: &str,
        args: &A,
        ttl_secs: u64,
        compute: F,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.is_enabled() {
            return compute().await;
        }

        let key = match memo_key(operation, args) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, operation = %operation, "cannot derive cache key, bypassing cache");
                return compute().await;
            }
        };

        if let Some(hit) = self.get_as::<T>(&key).await {
            return Ok(hit);
        }

        let result = compute().await?;
        self.set(&key, &result, ttl_secs).await;
        Ok(result)
    }
}
