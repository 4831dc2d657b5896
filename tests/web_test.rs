//! HTTP 接口：访问令牌、成功与失败响应

mod common;

use serde_json::{json, Value};
use std::sync::Arc;

use netdisk_relay::{web, AppState, Orchestrator, Provider};

use common::{mock_config, open_cache};

const CACHED_SOURCE: &str = "https://pan.quark.cn/s/abc123";

async fn serve(dir: &tempfile::TempDir) -> String {
    // 网盘接口不会被调用，base 随便填
    let mut config = mock_config("http://127.0.0.1:9", "", "");
    config.web.access_token = "secret".to_string();
    let state = Arc::new(AppState::new(config).unwrap());

    let cache = open_cache(dir).await;
    cache
        .store(CACHED_SOURCE, "https://pan.quark.cn/s/cached", "Movie X", Provider::Quark)
        .await
        .unwrap();
    let orchestrator = Orchestrator::from_state(state.clone(), cache);

    common::spawn_mock(web::create_router(state, Arc::new(orchestrator))).await
}

async fn post(base: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/api/redistribute", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_wrong_access_token_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&dir).await;

    let (status, body) = post(&base, json!({"share_url": CACHED_SOURCE, "token": "nope"})).await;

    assert_eq!(status, 401);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "InvalidAccessToken");
}

#[tokio::test]
async fn test_cached_link_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&dir).await;

    let (status, body) = post(&base, json!({"share_url": CACHED_SOURCE, "token": "secret"})).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["url"], "https://pan.quark.cn/s/cached");
}

#[tokio::test]
async fn test_missing_credential_is_reported_with_kind() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&dir).await;

    let (status, body) = post(
        &base,
        json!({"share_url": "https://pan.baidu.com/s/1abc", "pwd": "1a2b", "token": "secret"}),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "CredentialMissing");
}

#[tokio::test]
async fn test_lookalike_host_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&dir).await;

    let (_, body) = post(
        &base,
        json!({"share_url": "https://evilbaidu.com/s/1abc", "token": "secret"}),
    )
    .await;

    assert_eq!(body["error"]["kind"], "MalformedLink");
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&dir).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
}
