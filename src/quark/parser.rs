//! 夸克分享链接解析

use regex::Regex;
use std::sync::OnceLock;

use crate::provider::host_matches;

/// 从分享链接中提取 pwd_id
///
/// 支持：
/// - https://pan.quark.cn/s/abc123
/// - https://pan.quark.cn/s/abc123#/list/share
/// - https://pan.quark.cn/s/abc123?pwd=xxxx
pub fn extract_pwd_id(share_url: &str) -> Option<String> {
    let parsed = url::Url::parse(share_url.trim()).ok()?;
    if !host_matches(parsed.host_str()?, "quark.cn") {
        return None;
    }

    static PWD_ID_RE: OnceLock<Regex> = OnceLock::new();
    let re = PWD_ID_RE.get_or_init(|| Regex::new(r"^/s/([A-Za-z0-9]+)").unwrap());
    re.captures(parsed.path())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
