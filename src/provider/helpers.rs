//! 各网盘共用的小工具

use rand::Rng;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ErrorKind, RelayError};

/// 自己网盘里的一个文件/目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub id: String,
    pub name: String,
}

/// 取链接中的 query 参数
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let parsed = url::Url::parse(url.trim()).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 截取响应体用于日志，保证不切断 UTF-8 字符
pub fn preview(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// 读取响应体并反序列化为 JSON
///
/// 网盘接口出错时也常返回 JSON（带错误码），所以非 2xx 响应只要带有
/// `errno`/`code` 就交给调用方按错误码归类；否则算传输错误。
pub async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    step: &str,
) -> Result<T, RelayError> {
    let status = resp.status();
    let text = resp.text().await?;
    debug!("📨 {} 响应 (status={}): {}", step, status, preview(&text, 300));

    if !status.is_success() && !carries_error_code(&text) {
        return Err(RelayError::transport(format!(
            "{} 返回 HTTP {} (body={})",
            step,
            status.as_u16(),
            preview(&text, 200)
        )));
    }

    serde_json::from_str(&text).map_err(|e| {
        RelayError::transport(format!(
            "解析 {} 响应失败: {} (status={}, body={})",
            step,
            e,
            status,
            preview(&text, 200)
        ))
    })
}

/// 响应体是否带有网盘自己的错误码字段
fn carries_error_code(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.as_object()
                .map(|o| o.contains_key("errno") || o.contains_key("code"))
        })
        .unwrap_or(false)
}

/// 域名是否为 `domain` 本身或其子域名
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// 转存后定位副本
///
/// 转存接口不返回新文件的 id，只能列举目标目录（最新在前）按文件名匹配。
/// 第一次没匹配上时固定等待一次再列举；仍无同名项则退而取最新的一项。
/// 这是尽力而为：同一目录有并发写入时可能认错文件。
pub async fn locate_copy<F, Fut>(
    target_name: &str,
    settle: Duration,
    mut list_recent: F,
) -> Result<StoredItem, RelayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<StoredItem>, RelayError>>,
{
    let first = list_recent().await?;
    if let Some(item) = first.into_iter().find(|i| i.name == target_name) {
        info!("🎯 找到转存副本: {} ({})", item.name, item.id);
        return Ok(item);
    }

    info!("⏳ 暂未找到副本，等待 {:?} 后重新列举...", settle);
    tokio::time::sleep(settle).await;

    let second = list_recent().await?;
    if let Some(item) = second.iter().find(|i| i.name == target_name) {
        info!("🎯 找到转存副本: {} ({})", item.name, item.id);
        return Ok(item.clone());
    }

    match second.into_iter().next() {
        Some(latest) => {
            warn!(
                "⚠️ 未找到同名文件 '{}'，改用最新的一项: {} ({})",
                target_name, latest.name, latest.id
            );
            Ok(latest)
        }
        None => Err(RelayError::new(
            ErrorKind::CopyNotFound,
            format!("转存后目标目录为空，未找到 '{}'", target_name),
        )),
    }
}

/// 生成新分享的提取码（小写字母 + 数字）
pub fn generate_share_password(length: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
