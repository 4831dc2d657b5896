//! 应用状态：配置 + 共享 HTTP client
//!
//! 登录凭证不放进 client 的 Cookie Jar，而是每次转存构造独立的
//! [`ProviderSession`](crate::provider::ProviderSession)，避免并发请求互相污染。

use anyhow::Result;
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub client: Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.pipeline.http_timeout_secs))
            .user_agent(Config::browser_ua())
            .build()?;

        Ok(Self { config, client })
    }

    /// 定位副本前的固定等待
    pub fn copy_settle(&self) -> Duration {
        Duration::from_secs(self.config.pipeline.copy_settle_secs)
    }
}
