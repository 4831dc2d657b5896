//! 百度网盘转存功能模块

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use super::parser::short_surl;
use super::types::{errno_error, SharePage};
use super::web_url;
use crate::error::{ErrorKind, RelayError};
use crate::provider::helpers::read_json;
use crate::provider::ProviderSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct TransferResult {
    errno: i32,
    #[serde(default)]
    show_msg: String,
}

/// 验证保存路径是否存在
pub async fn verify_save_path(
    state: &AppState,
    session: &ProviderSession,
    path: &str,
) -> Result<bool, RelayError> {
    info!("🔍 验证保存路径: {}", path);

    let url = format!(
        "{}?dir={}&num=1&order=name&desc=0",
        web_url(state, "/api/list"),
        urlencoding::encode(path)
    );

    let resp = state
        .client
        .get(&url)
        .header("Cookie", session.cookie_header())
        .send()
        .await?;

    #[derive(Deserialize)]
    struct ApiListResponse {
        errno: i32,
    }

    let result: ApiListResponse = read_json(resp, "api/list").await?;

    match result.errno {
        0 => Ok(true),
        -6 => Err(errno_error(-6, "验证保存路径失败", "", ErrorKind::AuthRequired)),
        errno => {
            warn!("❌ 保存路径不存在 (errno={})", errno);
            Ok(false)
        }
    }
}

/// 在自己的网盘上创建目录
async fn create_remote_dir(
    state: &AppState,
    session: &ProviderSession,
    path: &str,
) -> Result<(), RelayError> {
    info!("🔧 创建远程目录: {}", path);

    let bdstoken = session.op_token.as_deref().unwrap_or_default();
    let url = format!(
        "{}?a=commit&clienttype=0&web=1&bdstoken={}",
        web_url(state, "/api/create"),
        bdstoken
    );

    let resp = state
        .client
        .post(&url)
        .header("Cookie", session.cookie_header())
        .header("Referer", "https://pan.baidu.com/")
        .form(&[("path", path), ("isdir", "1"), ("block_list", "[]")])
        .send()
        .await?;

    #[derive(Deserialize)]
    struct CreateResponse {
        errno: i32,
    }

    let res: CreateResponse = read_json(resp, "api/create").await?;
    if res.errno != 0 {
        return Err(errno_error(res.errno, "创建保存目录失败", path, ErrorKind::CopyRejected));
    }

    info!("✅ 远程目录创建成功: {}", path);
    Ok(())
}

/// 转存分享中的文件到 `save_path`
///
/// 接口返回时文件不一定已经出现在目录列表里。
pub async fn transfer_files(
    state: &AppState,
    session: &ProviderSession,
    page: &SharePage,
    fs_ids: &[u64],
    surl: &str,
) -> Result<(), RelayError> {
    info!("📦 开始转存 {} 个文件...", fs_ids.len());

    let savepath = &state.config.baidu.save_path;
    if !verify_save_path(state, session, savepath).await? {
        create_remote_dir(state, session, savepath).await?;
    }

    // ondup参数: newcopy(重命名), overwrite(覆盖), fail(失败)
    let bdstoken = session.op_token.as_deref().unwrap_or_default();
    let url = format!(
        "{}?shareid={}&from={}&ondup=newcopy&channel=chunlei&clienttype=0&web=1&bdstoken={}",
        web_url(state, "/share/transfer"),
        page.shareid,
        page.uk,
        bdstoken
    );

    let fsidlist = serde_json::to_string(fs_ids)?;
    let params = [("fsidlist", fsidlist.as_str()), ("path", savepath.as_str())];

    debug!(
        "📋 转存参数: shareid={}, from={}, fsidlist={}, path={}",
        page.shareid, page.uk, fsidlist, savepath
    );

    let referer = format!("https://pan.baidu.com/share/init?surl={}", short_surl(surl));
    let resp = state
        .client
        .post(&url)
        .header("Cookie", session.cookie_header())
        .header("Referer", &referer)
        .header("Origin", "https://pan.baidu.com")
        .header("Accept", "application/json, text/javascript, */*; q=0.01")
        .header("X-Requested-With", "XMLHttpRequest")
        .form(&params)
        .send()
        .await?;

    let result: TransferResult = read_json(resp, "share/transfer").await?;

    match result.errno {
        0 => {
            info!("✅ 转存成功，已保存至: {}", savepath);
            Ok(())
        }
        12 => {
            // ondup=newcopy 时通常表示部分文件已存在，后续按目录列表定位副本
            warn!("⚠️ 转存完成 (errno=12): {}", result.show_msg);
            Ok(())
        }
        2 if is_login_message(&result.show_msg) => {
            error!("🔐 Cookie 失效或未登录: {}", result.show_msg);
            Err(RelayError::new(
                ErrorKind::AuthRequired,
                format!("Cookie失效: {}", result.show_msg),
            ))
        }
        errno => {
            error!("❌ 转存失败: errno={}, show_msg={}", errno, result.show_msg);
            let err = errno_error(errno, "转存失败", &result.show_msg, ErrorKind::CopyRejected);
            if err.kind == ErrorKind::AuthRequired {
                return Err(err);
            }
            // 转存阶段的服务端拒绝统一归为 CopyRejected，保留原始 errno 说明
            Err(RelayError::new(ErrorKind::CopyRejected, err.detail))
        }
    }
}

fn is_login_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    ["未登录", "需要登录", "登陆", "login"]
        .iter()
        .any(|k| msg.contains(k))
}
