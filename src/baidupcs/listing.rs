//! 列举自己网盘中的目录

use serde::Deserialize;
use tracing::{debug, info};

use super::types::{errno_error, string_or_u64};
use super::web_url;
use crate::error::{ErrorKind, RelayError};
use crate::provider::helpers::read_json;
use crate::provider::{ProviderSession, StoredItem};
use crate::AppState;

/// 列举目录，按修改时间倒序（最新在前）
pub async fn list_directory_files(
    state: &AppState,
    session: &ProviderSession,
    path: &str,
) -> Result<Vec<StoredItem>, RelayError> {
    let url = format!(
        "{}?dir={}&num=100&order=time&desc=1",
        web_url(state, "/api/list"),
        urlencoding::encode(path)
    );

    debug!("📡 列举目录: {}", path);

    let resp = state
        .client
        .get(&url)
        .header("Cookie", session.cookie_header())
        .send()
        .await?;

    #[derive(Deserialize)]
    struct ListResult {
        errno: i32,
        #[serde(default)]
        list: Vec<FileInfo>,
    }

    #[derive(Deserialize)]
    struct FileInfo {
        #[serde(deserialize_with = "string_or_u64")]
        fs_id: u64,
        #[serde(default)]
        server_filename: String,
    }

    let result: ListResult = read_json(resp, "api/list").await?;

    if result.errno != 0 {
        return Err(errno_error(result.errno, "列举目录失败", path, ErrorKind::TransportError));
    }

    info!("📁 目录中共有 {} 个文件", result.list.len());
    for (i, file) in result.list.iter().take(5).enumerate() {
        debug!("  {}. {} (fs_id: {})", i + 1, file.server_filename, file.fs_id);
    }

    Ok(result
        .list
        .into_iter()
        .map(|f| StoredItem {
            id: f.fs_id.to_string(),
            name: f.server_filename,
        })
        .collect())
}
