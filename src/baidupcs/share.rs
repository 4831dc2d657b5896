//! 百度网盘分享链接解析模块
//!
//! 授权：访问 init 页面拿到 shareid/uk/bdstoken，有提取码时再调用 verify，
//! 把返回的 randsk 作为 BDCLND Cookie 并入会话，之后的请求都依赖它。

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::parser::short_surl;
use super::types::{errno_error, ShareFileItem, SharePage};
use super::web_url;
use crate::error::{ErrorKind, RelayError};
use crate::provider::helpers::{preview, read_json};
use crate::provider::ProviderSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct ListResponse {
    errno: i32,
    #[serde(default)]
    list: Vec<ShareFileItem>,
}

/// 授权：解析分享页面，校验提取码
///
/// 成功后 `session.op_token` 为 bdstoken，有提取码时会话 Cookie 中追加 BDCLND。
pub async fn authorize(
    state: &AppState,
    session: &mut ProviderSession,
    surl: &str,
    pwd: Option<&str>,
) -> Result<SharePage, RelayError> {
    let surl_param = short_surl(surl);
    let init_url = format!("{}?surl={}", web_url(state, "/share/init"), surl_param);

    info!("🌐 访问分享页面: {}", init_url);

    let resp = state
        .client
        .get(&init_url)
        .header("Cookie", session.cookie_header())
        .send()
        .await?;

    let html = resp.text().await?;
    debug!("📄 页面长度: {} 字节", html.len());

    if html.contains("platform-non-found") || html.contains("error-404") {
        return Err(RelayError::new(ErrorKind::AccessDenied, "分享不存在或已失效"));
    }

    let bdstoken = extract_bdstoken(&html).ok_or_else(|| {
        RelayError::new(
            ErrorKind::AuthRequired,
            "页面中没有 bdstoken，百度登录状态已失效",
        )
    })?;
    debug!("🔑 bdstoken 长度: {}", bdstoken.len());
    session.op_token = Some(bdstoken.clone());

    let page = extract_share_ids(&html)?;
    debug!("✅ 提取到: shareid={}, uk={}", page.shareid, page.uk);

    if let Some(pwd) = pwd.filter(|p| !p.is_empty()) {
        info!("🔐 验证提取码...");
        let randsk = verify_password(state, session, surl_param, pwd, &bdstoken).await?;
        session.merge_cookie("BDCLND", &randsk);
        session.share_token = Some(randsk);
        info!("✅ 提取码验证成功");
    }

    Ok(page)
}

/// 验证提取码，返回 randsk
async fn verify_password(
    state: &AppState,
    session: &ProviderSession,
    surl: &str,
    pwd: &str,
    bdstoken: &str,
) -> Result<String, RelayError> {
    // verify 的大部分参数在 query string，表单仅提交 pwd/vcode。
    // 少带或带错参数/请求头时，百度有时也会返回 errno=-12（看起来像“提取码错误”）。
    let ts_ms = chrono::Utc::now().timestamp_millis();
    let url = format!(
        "{}?surl={}&t={}&channel=chunlei&web=1&app_id=250528&clienttype=0&bdstoken={}",
        web_url(state, "/share/verify"),
        surl,
        ts_ms,
        bdstoken
    );

    let form = [("pwd", pwd), ("vcode", ""), ("vcode_str", "")];

    let resp = state
        .client
        .post(url)
        .header("Cookie", session.cookie_header())
        .header(
            "Referer",
            format!("https://pan.baidu.com/share/init?surl={}", surl),
        )
        .header("Origin", "https://pan.baidu.com")
        .header("X-Requested-With", "XMLHttpRequest")
        .form(&form)
        .send()
        .await?;

    #[derive(Deserialize)]
    struct VerifyResponse {
        errno: i32,
        #[serde(default)]
        err_msg: String,
        #[serde(default)]
        randsk: String,
    }

    let result: VerifyResponse = read_json(resp, "share/verify").await?;

    if result.errno != 0 {
        warn!("⚠️ verify errno: {}", result.errno);
        let err = match result.errno {
            -20 => RelayError::new(ErrorKind::AccessDenied, "验证次数过多，请稍后再试"),
            errno => errno_error(errno, "提取码验证失败", &result.err_msg, ErrorKind::AccessDenied),
        };
        return Err(err);
    }

    if result.randsk.is_empty() {
        return Err(RelayError::transport("verify 成功但未返回 randsk"));
    }

    Ok(result.randsk)
}

/// 获取文件列表
///
/// 调用 share/list API 获取分享链接根目录下的所有文件
pub async fn get_file_list(
    state: &AppState,
    session: &ProviderSession,
    page: &SharePage,
    surl: &str,
) -> Result<Vec<ShareFileItem>, RelayError> {
    let surl_param = short_surl(surl);
    let bdstoken = session.op_token.as_deref().unwrap_or_default();
    let url = format!(
        "{}?shareid={}&uk={}&shorturl={}&root=1&dir=%2F&page=1&num=1000&order=name&desc=1&showempty=0&web=1&channel=chunlei&clienttype=0&bdstoken={}",
        web_url(state, "/share/list"),
        page.shareid,
        page.uk,
        surl_param,
        bdstoken
    );

    info!("📋 获取文件列表...");

    let resp = state
        .client
        .get(&url)
        .header("Cookie", session.cookie_header())
        .header(
            "Referer",
            format!("https://pan.baidu.com/share/init?surl={}", surl_param),
        )
        .send()
        .await?;

    let res: ListResponse = read_json(resp, "share/list").await?;

    if res.errno != 0 {
        warn!("⚠️ list API errno: {}", res.errno);
        return Err(errno_error(res.errno, "获取文件列表失败", "", ErrorKind::AccessDenied));
    }

    info!("✅ 找到 {} 个文件", res.list.len());
    for (i, file) in res.list.iter().enumerate() {
        info!("  {}. {}", i + 1, file.server_filename);
    }

    Ok(res.list)
}

/// 从 HTML 中提取 shareid 和 uk
fn extract_share_ids(html: &str) -> Result<SharePage, RelayError> {
    // share/init 页面里可能出现多个 shareid/uk，取“数字最长”的那个，避免误抓到很小的数字（如 5）
    static SHAREID_RE: OnceLock<Regex> = OnceLock::new();
    let shareid_re = SHAREID_RE.get_or_init(|| Regex::new(r"shareid\D*?(\d+)").unwrap());
    let shareid = longest_capture(shareid_re, html).ok_or_else(|| {
        RelayError::new(
            ErrorKind::AccessDenied,
            format!("无法提取 shareid，页面格式可能已变化: {}", preview(html, 120)),
        )
    })?;

    static UK_RE: OnceLock<Regex> = OnceLock::new();
    let uk_re = UK_RE.get_or_init(|| Regex::new(r"uk\D*?(\d+)").unwrap());
    let uk = longest_capture(uk_re, html)
        .ok_or_else(|| RelayError::new(ErrorKind::AccessDenied, "无法提取 uk"))?;

    Ok(SharePage { shareid, uk })
}

fn longest_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .max_by_key(|s| s.len())
}

/// 从 HTML 中提取 bdstoken（32 位十六进制）
fn extract_bdstoken(html: &str) -> Option<String> {
    static BDSTOKEN_RE: OnceLock<Regex> = OnceLock::new();
    let re = BDSTOKEN_RE.get_or_init(|| Regex::new(r"bdstoken\W*?([a-f0-9]{32})").unwrap());
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<script>locals.mset({"shareid":5,"bdstoken":"0123456789abcdef0123456789abcdef","shareid":2837465910,"uk":1099511627,"share_uk":"1099511627"});</script>"#;

    #[test]
    fn test_extract_share_ids_prefers_longest() {
        let page = extract_share_ids(PAGE).unwrap();
        assert_eq!(page.shareid, "2837465910");
        assert_eq!(page.uk, "1099511627");
    }

    #[test]
    fn test_extract_bdstoken() {
        assert_eq!(
            extract_bdstoken(PAGE).as_deref(),
            Some("0123456789abcdef0123456789abcdef")
        );
        assert_eq!(extract_bdstoken(r#"{"bdstoken":null}"#), None);
    }

    #[test]
    fn test_missing_shareid_is_access_denied() {
        let err = extract_share_ids("<html>请输入提取码</html>").unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccessDenied);
    }
}
