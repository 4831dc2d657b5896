//! 网盘适配层
//!
//! 每个网盘实现 [`ShareAdapter`]，内部按固定顺序执行六步：
//! 解析 → 授权 → 列举 → 转存 → 定位副本 → 重新分享。
//! 任何一步失败都立即返回，后续步骤不再执行。

pub mod helpers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineOutcome, RelayError};

pub use helpers::{
    generate_share_password, host_matches, locate_copy, query_param, StoredItem,
};

/// 支持的网盘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Quark,
    Baidu,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Quark => "quark",
            Provider::Baidu => "baidu",
        }
    }

    /// 根据链接域名判断网盘
    pub fn detect(url: &str) -> Option<Provider> {
        let parsed = url::Url::parse(url.trim()).ok()?;
        let host = parsed.host_str()?;
        if host_matches(host, "quark.cn") {
            Some(Provider::Quark)
        } else if host_matches(host, "baidu.com") {
            Some(Provider::Baidu)
        } else {
            None
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quark" => Ok(Provider::Quark),
            "baidu" => Ok(Provider::Baidu),
            other => Err(RelayError::malformed(format!("未知网盘: {}", other))),
        }
    }
}

/// 一次转存请求的输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareReference {
    pub source_url: String,
    pub title: String,
    #[serde(default)]
    pub password: Option<String>,
    pub provider: Provider,
}

impl ShareReference {
    pub fn new(
        source_url: impl Into<String>,
        title: impl Into<String>,
        password: Option<String>,
        provider: Provider,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            title: title.into(),
            password,
            provider,
        }
    }

    /// 实际使用的提取码：优先显式传入，其次链接里的 `pwd=` 参数
    pub fn effective_password(&self) -> Option<String> {
        self.password
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .or_else(|| query_param(&self.source_url, "pwd"))
    }
}

/// 搜索端给出的单个链接
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredLink {
    pub url: String,
    #[serde(default)]
    pub pwd: Option<String>,
}

/// 搜索端给出的一条资源记录，可能同时带百度和夸克链接
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredResource {
    pub title: String,
    #[serde(default)]
    pub baidu: Option<DiscoveredLink>,
    #[serde(default)]
    pub quark: Option<DiscoveredLink>,
}

impl DiscoveredResource {
    pub fn share_reference(&self, provider: Provider) -> Option<ShareReference> {
        let link = match provider {
            Provider::Baidu => self.baidu.as_ref()?,
            Provider::Quark => self.quark.as_ref()?,
        };
        Some(ShareReference::new(
            link.url.clone(),
            self.title.clone(),
            link.pwd.clone(),
            provider,
        ))
    }
}

/// 单次转存独占的会话
///
/// 凭证来自配置；其余字段在流水线中途由服务端下发，转存结束即丢弃。
#[derive(Debug, Clone)]
pub struct ProviderSession {
    credential: String,
    /// 授权过程中服务端追加的 Cookie（如百度的 BDCLND）
    extra_cookies: Vec<(String, String)>,
    /// 分享访问令牌（夸克 stoken）
    pub share_token: Option<String>,
    /// 页面级操作令牌（百度 bdstoken）
    pub op_token: Option<String>,
    /// 转存提交后的后台任务 id（夸克）
    pub task_id: Option<String>,
}

impl ProviderSession {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            extra_cookies: Vec::new(),
            share_token: None,
            op_token: None,
            task_id: None,
        }
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// 追加一个 Cookie；同名的会被覆盖
    pub fn merge_cookie(&mut self, name: &str, value: &str) {
        self.extra_cookies.retain(|(n, _)| n != name);
        self.extra_cookies.push((name.to_string(), value.to_string()));
    }

    /// 请求头里使用的完整 Cookie
    pub fn cookie_header(&self) -> String {
        let mut header = self.credential.trim().trim_end_matches(';').to_string();
        for (name, value) in &self.extra_cookies {
            if !header.is_empty() {
                header.push_str("; ");
            }
            header.push_str(name);
            header.push('=');
            header.push_str(value);
        }
        header
    }
}

/// 网盘适配器
#[async_trait]
pub trait ShareAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// 完整执行一次转存 + 重新分享
    async fn redistribute(
        &self,
        share: &ShareReference,
        session: ProviderSession,
    ) -> PipelineOutcome;
}
