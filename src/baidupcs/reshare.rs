//! 重新分享：百度的分享必须带提取码，每次随机生成

use serde::Deserialize;
use tracing::{error, info};

use super::types::errno_error;
use super::web_url;
use crate::error::{ErrorKind, RelayError};
use crate::provider::helpers::{generate_share_password, read_json};
use crate::provider::ProviderSession;
use crate::AppState;

/// 永久有效
const PERIOD_PERMANENT: &str = "0";

/// 为副本创建带提取码的永久分享，返回 `链接?pwd=提取码`
pub async fn create_share(
    state: &AppState,
    session: &ProviderSession,
    fs_id: &str,
) -> Result<String, RelayError> {
    let pwd = generate_share_password(4);
    info!("🔗 创建分享: fs_id={}", fs_id);

    let bdstoken = session.op_token.as_deref().unwrap_or_default();
    let url = format!(
        "{}?channel=chunlei&clienttype=0&web=1&bdstoken={}",
        web_url(state, "/share/set"),
        bdstoken
    );

    let fid_list = format!("[{}]", fs_id);
    let form = [
        ("schannel", "4"),
        ("channel_list", "[]"),
        ("period", PERIOD_PERMANENT),
        ("pwd", pwd.as_str()),
        ("fid_list", fid_list.as_str()),
    ];

    let resp = state
        .client
        .post(&url)
        .header("Cookie", session.cookie_header())
        .header("Referer", "https://pan.baidu.com/disk/home")
        .header("Origin", "https://pan.baidu.com")
        .header("X-Requested-With", "XMLHttpRequest")
        .form(&form)
        .send()
        .await?;

    #[derive(Deserialize)]
    struct ShareSetResponse {
        errno: i32,
        #[serde(default)]
        link: String,
        #[serde(default)]
        shorturl: String,
        #[serde(default)]
        show_msg: String,
    }

    let res: ShareSetResponse = read_json(resp, "share/set").await?;

    if res.errno != 0 {
        error!("❌ 创建分享失败: errno={}, show_msg={}", res.errno, res.show_msg);
        let err = errno_error(res.errno, "创建分享失败", &res.show_msg, ErrorKind::ShareCreationFailed);
        if err.kind == ErrorKind::AuthRequired {
            return Err(err);
        }
        return Err(RelayError::new(ErrorKind::ShareCreationFailed, err.detail));
    }

    let link = if !res.link.is_empty() { res.link } else { res.shorturl };
    if link.is_empty() {
        return Err(RelayError::new(ErrorKind::ShareCreationFailed, "创建分享成功但未返回链接"));
    }

    Ok(with_password(&link, &pwd))
}

/// 把提取码拼到链接上；链接已带 pwd 时原样返回
fn with_password(link: &str, pwd: &str) -> String {
    if link.contains("pwd=") {
        return link.to_string();
    }
    let connector = if link.contains('?') { "&" } else { "?" };
    format!("{}{}pwd={}", link, connector, pwd)
}
