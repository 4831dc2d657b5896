//! 夸克分享：获取 stoken、列举分享内容

use serde_json::json;
use tracing::{debug, info};

use super::types::{DetailData, QuarkResponse, SharedItem, TokenData};
use super::{api_url, with_headers};
use crate::error::{ErrorKind, RelayError};
use crate::provider::helpers::read_json;
use crate::provider::ProviderSession;
use crate::AppState;

/// 用 pwd_id + 提取码换取分享访问令牌 stoken
pub async fn get_stoken(
    state: &AppState,
    session: &ProviderSession,
    pwd_id: &str,
    passcode: &str,
) -> Result<String, RelayError> {
    info!("🔐 获取分享 stoken: pwd_id={}", pwd_id);

    let url = api_url(state, "/1/clouddrive/share/sharepage/token");
    let resp = with_headers(state.client.post(&url), session)
        .json(&json!({ "pwd_id": pwd_id, "passcode": passcode }))
        .send()
        .await?;

    let res: QuarkResponse<TokenData> = read_json(resp, "sharepage/token").await?;
    let data = res.into_data(ErrorKind::AccessDenied, "获取 stoken 失败")?;

    if data.stoken.is_empty() {
        return Err(RelayError::new(ErrorKind::AccessDenied, "服务端返回空 stoken"));
    }
    debug!("✅ stoken 长度: {}", data.stoken.len());
    Ok(data.stoken)
}

/// 列举分享根目录下的文件
pub async fn list_share_items(
    state: &AppState,
    session: &ProviderSession,
    pwd_id: &str,
    stoken: &str,
) -> Result<Vec<SharedItem>, RelayError> {
    info!("📋 获取分享文件列表...");

    let url = api_url(state, "/1/clouddrive/share/sharepage/detail");
    let resp = with_headers(state.client.get(&url), session)
        .query(&[
            ("pwd_id", pwd_id),
            ("stoken", stoken),
            ("pdir_fid", "0"),
            ("force", "0"),
            ("_page", "1"),
            ("_size", "50"),
            ("_fetch_banner", "0"),
            ("_fetch_share", "0"),
            ("_fetch_total", "1"),
            ("_sort", "file_type:asc,file_name:asc"),
        ])
        .send()
        .await?;

    let res: QuarkResponse<DetailData> = read_json(resp, "sharepage/detail").await?;
    let data = res.into_data(ErrorKind::AccessDenied, "获取分享文件列表失败")?;

    info!("✅ 分享中有 {} 个文件", data.list.len());
    for (i, item) in data.list.iter().enumerate() {
        info!("  {}. {}{}", i + 1, item.file_name, if item.dir { "/" } else { "" });
    }

    Ok(data.list)
}
