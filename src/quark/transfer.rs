//! 夸克转存：保存到自己网盘、按更新时间列举目标目录

use serde_json::json;
use tracing::info;

use super::types::{QuarkResponse, SharedItem, SortData, TaskIdData};
use super::{api_url, with_headers};
use crate::error::{ErrorKind, RelayError};
use crate::provider::helpers::read_json;
use crate::provider::{ProviderSession, StoredItem};
use crate::AppState;

/// 转存分享内容到 `save_dir_fid`，返回后台任务 id
///
/// 接口返回时文件不一定已经落盘。
pub async fn save_items(
    state: &AppState,
    session: &ProviderSession,
    pwd_id: &str,
    stoken: &str,
    items: &[SharedItem],
) -> Result<String, RelayError> {
    let to_pdir_fid = &state.config.quark.save_dir_fid;
    info!("📦 转存 {} 个文件到目录 fid={}...", items.len(), to_pdir_fid);

    let fid_list: Vec<&str> = items.iter().map(|i| i.fid.as_str()).collect();
    let fid_token_list: Vec<&str> = items.iter().map(|i| i.share_fid_token.as_str()).collect();

    let url = api_url(state, "/1/clouddrive/share/sharepage/save");
    let resp = with_headers(state.client.post(&url), session)
        .json(&json!({
            "fid_list": fid_list,
            "fid_token_list": fid_token_list,
            "to_pdir_fid": to_pdir_fid,
            "pwd_id": pwd_id,
            "stoken": stoken,
            "pdir_fid": "0",
            "scene": "link",
        }))
        .send()
        .await?;

    let res: QuarkResponse<TaskIdData> = read_json(resp, "sharepage/save").await?;
    let data = res.into_data(ErrorKind::CopyRejected, "转存失败")?;

    info!("✅ 转存请求已提交: task_id={}", data.task_id);
    Ok(data.task_id)
}

/// 列举目标目录，最近更新的在前
pub async fn list_recent(
    state: &AppState,
    session: &ProviderSession,
) -> Result<Vec<StoredItem>, RelayError> {
    let url = api_url(state, "/1/clouddrive/file/sort");
    let resp = with_headers(state.client.get(&url), session)
        .query(&[
            ("pdir_fid", state.config.quark.save_dir_fid.as_str()),
            ("_page", "1"),
            ("_size", "50"),
            ("_fetch_total", "1"),
            ("_sort", "updated_at:desc"),
        ])
        .send()
        .await?;

    let res: QuarkResponse<SortData> = read_json(resp, "file/sort").await?;
    let data = res.into_data(ErrorKind::TransportError, "列举目标目录失败")?;

    info!("📁 目标目录中共有 {} 个文件", data.list.len());
    Ok(data
        .list
        .into_iter()
        .map(|f| StoredItem {
            id: f.fid,
            name: f.file_name,
        })
        .collect())
}
