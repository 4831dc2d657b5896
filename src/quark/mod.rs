//! 夸克网盘适配器
//!
//! 无状态接口：每个请求都带完整 Cookie 和参数，分享访问令牌 stoken 通过参数传递。

pub mod parser;
pub mod reshare;
pub mod share;
pub mod transfer;
pub mod types;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use std::sync::Arc;
use tracing::info;

use crate::error::{ErrorKind, PipelineOutcome, RelayError};
use crate::provider::{locate_copy, Provider, ProviderSession, ShareAdapter, ShareReference};
use crate::AppState;

pub use parser::extract_pwd_id;

/// 拼接接口地址，带上夸克要求的公共参数
pub(crate) fn api_url(state: &AppState, path: &str) -> String {
    format!(
        "{}{}?pr=ucpro&fr=pc",
        state.config.quark.api_base.trim_end_matches('/'),
        path
    )
}

pub(crate) fn with_headers(builder: RequestBuilder, session: &ProviderSession) -> RequestBuilder {
    builder
        .header("Cookie", session.cookie_header())
        .header("Referer", "https://pan.quark.cn/")
        .header("Origin", "https://pan.quark.cn")
        .header("Accept", "application/json, text/plain, */*")
}

pub struct QuarkAdapter {
    state: Arc<AppState>,
}

impl QuarkAdapter {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ShareAdapter for QuarkAdapter {
    fn provider(&self) -> Provider {
        Provider::Quark
    }

    async fn redistribute(
        &self,
        share: &ShareReference,
        mut session: ProviderSession,
    ) -> PipelineOutcome {
        let state = self.state.as_ref();
        info!("🚀 夸克转存: {}", share.source_url);

        // 1) 解析
        let pwd_id = extract_pwd_id(&share.source_url).ok_or_else(|| {
            RelayError::malformed(format!("无法从链接中提取 pwd_id: {}", share.source_url))
        })?;

        // 2) 授权
        let passcode = share.effective_password().unwrap_or_default();
        let stoken = share::get_stoken(state, &session, &pwd_id, &passcode).await?;
        session.share_token = Some(stoken.clone());

        // 3) 列举
        let items = share::list_share_items(state, &session, &pwd_id, &stoken).await?;
        let primary = items
            .first()
            .cloned()
            .ok_or_else(|| RelayError::new(ErrorKind::EmptyShare, "分享中没有可转存的文件"))?;

        // 4) 转存
        let task_id = transfer::save_items(state, &session, &pwd_id, &stoken, &items).await?;
        session.task_id = Some(task_id);

        // 5) 定位副本
        let session_ref = &session;
        let copy = locate_copy(&primary.file_name, state.copy_settle(), move || {
            transfer::list_recent(state, session_ref)
        })
        .await
        .map_err(|e| match &session.task_id {
            // 带上转存任务 id，便于在夸克侧排查
            Some(task_id) => RelayError::new(e.kind, format!("{} (转存任务 {})", e.detail, task_id)),
            None => e,
        })?;

        // 6) 重新分享
        let url = reshare::create_share(state, &session, &copy.id, &share.title).await?;
        info!("✅ 夸克转存完成: {} → {}", share.source_url, url);
        Ok(url)
    }
}
