//! 百度网盘适配器
//!
//! 有状态会话：bdstoken 在授权时从页面取一次并复用，
//! 提取码校验后下发的 randsk 以 BDCLND Cookie 的形式累积到会话里。

pub mod listing;
pub mod parser;
pub mod reshare;
pub mod share;
pub mod transfer;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::error::{ErrorKind, PipelineOutcome, RelayError};
use crate::provider::{locate_copy, Provider, ProviderSession, ShareAdapter, ShareReference};
use crate::AppState;

pub use parser::extract_surl;
pub use types::{ShareFileItem, SharePage};

pub(crate) fn web_url(state: &AppState, path: &str) -> String {
    format!("{}{}", state.config.baidu.web_base.trim_end_matches('/'), path)
}

pub struct BaiduAdapter {
    state: Arc<AppState>,
}

impl BaiduAdapter {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ShareAdapter for BaiduAdapter {
    fn provider(&self) -> Provider {
        Provider::Baidu
    }

    async fn redistribute(
        &self,
        share: &ShareReference,
        mut session: ProviderSession,
    ) -> PipelineOutcome {
        let state = self.state.as_ref();
        info!("🚀 百度转存: {}", share.source_url);

        // 1) 解析
        let surl = extract_surl(&share.source_url).ok_or_else(|| {
            RelayError::malformed(format!("无法从链接中提取 surl: {}", share.source_url))
        })?;

        // 2) 授权
        let pwd = share.effective_password();
        let page = share::authorize(state, &mut session, &surl, pwd.as_deref()).await?;

        // 3) 列举
        let files = share::get_file_list(state, &session, &page, &surl).await?;
        let primary = files
            .first()
            .cloned()
            .ok_or_else(|| RelayError::new(ErrorKind::EmptyShare, "未找到可转存的文件"))?;
        let fs_ids: Vec<u64> = files.iter().map(|f| f.fs_id).collect();

        // 4) 转存
        transfer::transfer_files(state, &session, &page, &fs_ids, &surl).await?;

        // 5) 定位副本
        let save_path = state.config.baidu.save_path.as_str();
        let session_ref = &session;
        let copy = locate_copy(&primary.server_filename, state.copy_settle(), move || {
            listing::list_directory_files(state, session_ref, save_path)
        })
        .await?;

        // 6) 重新分享
        let url = reshare::create_share(state, &session, &copy.id).await?;
        info!("✅ 百度转存完成: {} → {}", share.source_url, url);
        Ok(url)
    }
}
