//! 测试共用：临时缓存、本地 mock 服务器、配置

#![allow(dead_code)]

use axum::Router;
use netdisk_relay::{Config, RedistributionCache};

pub async fn open_cache(dir: &tempfile::TempDir) -> RedistributionCache {
    RedistributionCache::connect(&database_url(dir)).await.unwrap()
}

pub fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite:{}", dir.path().join("relay.db").display())
}

/// 在 127.0.0.1 随机端口上启动 mock 服务器，返回 base url
pub async fn spawn_mock(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 两个网盘都指向同一个 mock base url，定位副本不等待
pub fn mock_config(base: &str, quark_cookie: &str, baidu_cookie: &str) -> Config {
    Config::parse(&format!(
        r#"
        [quark]
        cookie = "{quark_cookie}"
        save_dir_fid = "dest0"
        api_base = "{base}"

        [baidu]
        cookie = "{baidu_cookie}"
        save_path = "/转存"
        web_base = "{base}"

        [pipeline]
        http_timeout_secs = 5
        copy_settle_secs = 0
        task_poll_limit = 3
        "#
    ))
    .unwrap()
}
