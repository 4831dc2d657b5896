//! 转存调度入口
//!
//! 先查缓存，命中直接返回；未命中则调用对应网盘的适配器，成功后先写缓存再返回。
//! 同一 source_url 的未命中路径由进程内的按键互斥锁串行化，
//! 拿到锁后会再查一次缓存，避免并发请求重复转存。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::baidupcs::BaiduAdapter;
use crate::cache::RedistributionCache;
use crate::error::{ErrorKind, RelayError};
use crate::provider::{Provider, ProviderSession, ShareAdapter, ShareReference};
use crate::AppState;

pub struct Orchestrator {
    cache: RedistributionCache,
    adapters: HashMap<Provider, Arc<dyn ShareAdapter>>,
    credentials: HashMap<Provider, String>,
    locks: KeyLocks,
}

impl Orchestrator {
    /// 空的调度器；通过 [`with_adapter`](Self::with_adapter) 注册网盘
    pub fn new(cache: RedistributionCache) -> Self {
        Self {
            cache,
            adapters: HashMap::new(),
            credentials: HashMap::new(),
            locks: KeyLocks::default(),
        }
    }

    /// 按配置注册夸克和百度
    pub fn from_state(state: Arc<AppState>, cache: RedistributionCache) -> Self {
        let quark_cookie = state.config.credential(Provider::Quark).map(str::to_string);
        let baidu_cookie = state.config.credential(Provider::Baidu).map(str::to_string);

        Self::new(cache)
            .with_adapter(Arc::new(crate::quark::QuarkAdapter::new(state.clone())), quark_cookie)
            .with_adapter(Arc::new(BaiduAdapter::new(state)), baidu_cookie)
    }

    /// 注册适配器；`credential` 为 None 时该网盘的请求会返回 CredentialMissing
    pub fn with_adapter(
        mut self,
        adapter: Arc<dyn ShareAdapter>,
        credential: Option<String>,
    ) -> Self {
        let provider = adapter.provider();
        match credential.filter(|c| !c.trim().is_empty()) {
            Some(c) => {
                self.credentials.insert(provider, c);
            }
            None => {
                self.credentials.remove(&provider);
            }
        }
        self.adapters.insert(provider, adapter);
        self
    }

    pub fn cache(&self) -> &RedistributionCache {
        &self.cache
    }

    /// 是否已配置该网盘的凭证
    pub fn is_available(&self, provider: Provider) -> bool {
        self.adapters.contains_key(&provider) && self.credentials.contains_key(&provider)
    }

    /// 返回源链接对应的新分享链接，必要时执行转存
    pub async fn resolve(&self, share: &ShareReference) -> Result<String, RelayError> {
        if let Some(url) = self.cache.lookup(&share.source_url).await? {
            info!("⚡ 缓存命中: {} → {}", share.source_url, url);
            return Ok(url);
        }

        let adapter = self.adapters.get(&share.provider).ok_or_else(|| {
            RelayError::new(
                ErrorKind::CredentialMissing,
                format!("未注册网盘: {}", share.provider),
            )
        })?;
        let credential = self.credentials.get(&share.provider).ok_or_else(|| {
            RelayError::new(
                ErrorKind::CredentialMissing,
                format!("未配置 {} 的登录凭证", share.provider),
            )
        })?;

        let _guard = self.locks.acquire(&share.source_url).await;

        // 等锁期间可能已有同链接的请求完成
        if let Some(url) = self.cache.lookup(&share.source_url).await? {
            info!("⚡ 等待期间已完成转存: {} → {}", share.source_url, url);
            return Ok(url);
        }

        let session = ProviderSession::new(credential.clone());
        let url = match adapter.redistribute(share, session).await {
            Ok(url) => url,
            Err(e) => {
                error!("❌ 转存失败 [{}] {}: {}", share.provider, share.source_url, e);
                return Err(e);
            }
        };

        self.cache
            .store(&share.source_url, &url, &share.title, share.provider)
            .await?;

        Ok(url)
    }
}

/// 按 source_url 的异步互斥锁表；无人持有时自动移除
#[derive(Default)]
struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
    lock: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &str) -> KeyGuard<'_> {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        let lock = entry.lock_owned().await;
        KeyGuard {
            locks: self,
            key: key.to_string(),
            lock: Some(lock),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // 先释放锁，再判断是否还有其他等待者持有这把锁
        self.lock.take();
        let mut map = self.locks.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = map.get(&self.key) {
            if Arc::strong_count(entry) == 1 {
                map.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_key_locks_serialize_same_key() {
        let locks = Arc::new(KeyLocks::default());
        let first = locks.acquire("a").await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire("a").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_key_locks_independent_keys() {
        let locks = KeyLocks::default();
        let _a = locks.acquire("a").await;
        let _b = locks.acquire("b").await;
        assert_eq!(locks.len(), 2);
    }
}
