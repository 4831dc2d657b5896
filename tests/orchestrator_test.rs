//! 调度器行为：缓存命中、凭证检查、失败不落库、并发去重

mod common;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netdisk_relay::error::{ErrorKind, PipelineOutcome, RelayError};
use netdisk_relay::provider::{
    locate_copy, Provider, ProviderSession, ShareAdapter, ShareReference, StoredItem,
};
use netdisk_relay::Orchestrator;

use common::open_cache;

enum Behavior {
    /// 每次返回 `<prefix><第几次调用>`
    Succeed(&'static str),
    Fail(ErrorKind),
    /// 定位副本时目录一直为空
    LocateEmpty,
    /// 慢速成功，用于并发测试
    Slow(&'static str),
}

struct StubAdapter {
    provider: Provider,
    calls: Arc<AtomicUsize>,
    behavior: Behavior,
}

impl StubAdapter {
    fn new(provider: Provider, behavior: Behavior) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = Arc::new(Self {
            provider,
            calls: calls.clone(),
            behavior,
        });
        (adapter, calls)
    }
}

#[async_trait]
impl ShareAdapter for StubAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn redistribute(
        &self,
        _share: &ShareReference,
        _session: ProviderSession,
    ) -> PipelineOutcome {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            Behavior::Succeed(prefix) => Ok(format!("{}{}", prefix, n)),
            Behavior::Fail(kind) => Err(RelayError::new(*kind, "stub failure")),
            Behavior::LocateEmpty => {
                let copy = locate_copy("Movie X", Duration::ZERO, || async {
                    Ok::<Vec<StoredItem>, RelayError>(vec![])
                })
                .await?;
                Ok(copy.id)
            }
            Behavior::Slow(prefix) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(format!("{}{}", prefix, n))
            }
        }
    }
}

fn movie_ref(provider: Provider) -> ShareReference {
    ShareReference::new(
        "https://pan.example/s/abc123",
        "Movie X",
        Some("1a2b".to_string()),
        provider,
    )
}

#[tokio::test]
async fn test_resolve_then_cache_hit_without_adapter_call() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, calls) =
        StubAdapter::new(Provider::Quark, Behavior::Succeed("https://pan.example/s/zzz"));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("cookie".to_string()));

    let first = orchestrator.resolve(&movie_ref(Provider::Quark)).await.unwrap();
    assert_eq!(first, "https://pan.example/s/zzz1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // 同一链接，不同标题和提取码
    let again = ShareReference::new(
        "https://pan.example/s/abc123",
        "Other title",
        None,
        Provider::Quark,
    );
    let second = orchestrator.resolve(&again).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scenario_movie_x() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, calls) =
        StubAdapter::new(Provider::Quark, Behavior::Succeed("https://pan.example/s/zzz99"));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("cookie".to_string()));

    let url = orchestrator.resolve(&movie_ref(Provider::Quark)).await.unwrap();
    assert_eq!(url, "https://pan.example/s/zzz991");

    calls.store(0, Ordering::SeqCst);
    let again = ShareReference::new(
        "https://pan.example/s/abc123",
        "whatever",
        Some("zzzz".to_string()),
        Provider::Quark,
    );
    assert_eq!(orchestrator.resolve(&again).await.unwrap(), url);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let record = orchestrator
        .cache()
        .record("https://pan.example/s/abc123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.title, "Movie X");
    assert_eq!(record.provider, Provider::Quark);
}

#[tokio::test]
async fn test_sequential_resolves_keep_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, calls) =
        StubAdapter::new(Provider::Baidu, Behavior::Succeed("https://pan.baidu.com/s/1new"));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("BDUSS=x".to_string()));

    for i in 0..5 {
        let share = ShareReference::new(
            "https://pan.baidu.com/s/1abc",
            format!("title {}", i),
            Some(format!("{:04}", i)),
            Provider::Baidu,
        );
        assert_eq!(
            orchestrator.resolve(&share).await.unwrap(),
            "https://pan.baidu.com/s/1new1"
        );
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.cache().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_failure_is_returned_and_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, calls) = StubAdapter::new(Provider::Quark, Behavior::Fail(ErrorKind::AccessDenied));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("cookie".to_string()));

    let err = orchestrator.resolve(&movie_ref(Provider::Quark)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessDenied);
    assert_eq!(err.detail, "stub failure");
    assert!(orchestrator
        .cache()
        .lookup("https://pan.example/s/abc123")
        .await
        .unwrap()
        .is_none());

    // 失败不缓存，下一次仍会重新执行
    let _ = orchestrator.resolve(&movie_ref(Provider::Quark)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_credential_skips_adapter() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, calls) = StubAdapter::new(Provider::Quark, Behavior::Succeed("unused"));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("   ".to_string()));

    assert!(!orchestrator.is_available(Provider::Quark));
    let err = orchestrator.resolve(&movie_ref(Provider::Quark)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CredentialMissing);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unregistered_provider_is_credential_missing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, calls) = StubAdapter::new(Provider::Quark, Behavior::Succeed("unused"));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("cookie".to_string()));

    let err = orchestrator.resolve(&movie_ref(Provider::Baidu)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CredentialMissing);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cached_link_served_even_without_credential() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    cache
        .store(
            "https://pan.example/s/abc123",
            "https://pan.example/s/cached",
            "Movie X",
            Provider::Quark,
        )
        .await
        .unwrap();

    let (stub, calls) = StubAdapter::new(Provider::Quark, Behavior::Succeed("unused"));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, None);

    let url = orchestrator.resolve(&movie_ref(Provider::Quark)).await.unwrap();
    assert_eq!(url, "https://pan.example/s/cached");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_locate_empty_is_copy_not_found_and_cache_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, _calls) = StubAdapter::new(Provider::Quark, Behavior::LocateEmpty);
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("cookie".to_string()));

    let err = orchestrator.resolve(&movie_ref(Provider::Quark)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CopyNotFound);
    assert_eq!(orchestrator.cache().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_same_link_runs_pipeline_once() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, calls) =
        StubAdapter::new(Provider::Quark, Behavior::Slow("https://pan.example/s/new"));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("cookie".to_string()));

    let share = movie_ref(Provider::Quark);
    let (a, b, c) = tokio::join!(
        orchestrator.resolve(&share),
        orchestrator.resolve(&share),
        orchestrator.resolve(&share),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.unwrap(), "https://pan.example/s/new1");
    assert_eq!(b.unwrap(), "https://pan.example/s/new1");
    assert_eq!(c.unwrap(), "https://pan.example/s/new1");
}

#[tokio::test]
async fn test_concurrent_different_links_do_not_block_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir).await;
    let (stub, calls) =
        StubAdapter::new(Provider::Quark, Behavior::Slow("https://pan.example/s/new"));
    let orchestrator = Orchestrator::new(cache).with_adapter(stub, Some("cookie".to_string()));

    let one = ShareReference::new("https://pan.example/s/one", "1", None, Provider::Quark);
    let two = ShareReference::new("https://pan.example/s/two", "2", None, Provider::Quark);
    let (a, b) = tokio::join!(orchestrator.resolve(&one), orchestrator.resolve(&two));

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_ne!(a.unwrap(), b.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(orchestrator.cache().count().await.unwrap(), 2);
}
