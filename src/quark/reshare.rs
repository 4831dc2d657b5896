//! 夸克重新分享

use serde_json::json;
use tracing::{debug, info};

use super::types::{
    CreateShareRequest, ExpiredType, QuarkResponse, SharePasswordData, TaskData, TaskIdData,
    UrlType,
};
use super::{api_url, with_headers};
use crate::error::{ErrorKind, RelayError};
use crate::provider::helpers::read_json;
use crate::provider::ProviderSession;
use crate::AppState;

/// 为副本创建永久公开分享，返回分享链接
pub async fn create_share(
    state: &AppState,
    session: &ProviderSession,
    fid: &str,
    title: &str,
) -> Result<String, RelayError> {
    info!("🔗 创建分享: fid={}, title={}", fid, title);

    let body = CreateShareRequest {
        fid_list: vec![fid],
        title,
        url_type: UrlType::Public,
        expired_type: ExpiredType::Permanent,
    };

    let url = api_url(state, "/1/clouddrive/share");
    let resp = with_headers(state.client.post(&url), session)
        .json(&body)
        .send()
        .await?;

    let res: QuarkResponse<TaskIdData> = read_json(resp, "share").await?;
    let task = res.into_data(ErrorKind::ShareCreationFailed, "创建分享失败")?;

    let share_id = wait_share_task(state, session, &task.task_id).await?;
    fetch_share_url(state, session, &share_id).await
}

/// 查询分享任务直到拿到 share_id；服务端会挂起请求，这里不额外休眠
async fn wait_share_task(
    state: &AppState,
    session: &ProviderSession,
    task_id: &str,
) -> Result<String, RelayError> {
    let limit = state.config.pipeline.task_poll_limit.max(1);
    let url = api_url(state, "/1/clouddrive/task");

    for retry_index in 0..limit {
        let retry = retry_index.to_string();
        let resp = with_headers(state.client.get(&url), session)
            .query(&[("task_id", task_id), ("retry_index", retry.as_str())])
            .send()
            .await?;

        let res: QuarkResponse<TaskData> = read_json(resp, "task").await?;
        let data = res.into_data(ErrorKind::ShareCreationFailed, "查询分享任务失败")?;
        debug!("⏳ 分享任务 {} 状态: {}", task_id, data.status);

        if data.status == TaskData::DONE {
            return data.share_id.filter(|s| !s.is_empty()).ok_or_else(|| {
                RelayError::new(ErrorKind::ShareCreationFailed, "分享任务完成但未返回 share_id")
            });
        }
    }

    Err(RelayError::new(
        ErrorKind::ShareCreationFailed,
        format!("分享任务 {} 在 {} 次查询内未完成", task_id, limit),
    ))
}

async fn fetch_share_url(
    state: &AppState,
    session: &ProviderSession,
    share_id: &str,
) -> Result<String, RelayError> {
    let url = api_url(state, "/1/clouddrive/share/password");
    let resp = with_headers(state.client.post(&url), session)
        .json(&json!({ "share_id": share_id }))
        .send()
        .await?;

    let res: QuarkResponse<SharePasswordData> = read_json(resp, "share/password").await?;
    let data = res.into_data(ErrorKind::ShareCreationFailed, "获取分享链接失败")?;

    info!("✅ 新分享链接: {}", data.share_url);
    Ok(data.share_url)
}
