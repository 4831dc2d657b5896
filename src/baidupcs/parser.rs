//! 链接解析

use crate::provider::host_matches;

/// 从分享链接中提取 surl
///
/// 支持：
/// - https://pan.baidu.com/s/1xxxx
/// - https://pan.baidu.com/share/init?surl=xxxx
/// - ...?surl=xxxx
///
/// 非百度域名的链接一律返回 None。
pub fn extract_surl(share_url: &str) -> Option<String> {
    let url = share_url.trim();

    let host = url::Url::parse(url).ok()?.host_str()?.to_string();
    if !host_matches(&host, "baidu.com") {
        return None;
    }

    if let Some(pos) = url.find("/s/") {
        if let Some(surl) = take_token(&url[pos + 3..]) {
            return Some(surl);
        }
    }

    if let Some(pos) = url.find("surl=") {
        // init 页面上的 surl 不带前缀 '1'
        if let Some(surl) = take_token(&url[pos + 5..]) {
            return Some(format!("1{}", surl));
        }
    }

    None
}

fn take_token(rest: &str) -> Option<String> {
    let end = rest
        .find(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
        .unwrap_or(rest.len());

    if end > 0 {
        Some(rest[..end].to_string())
    } else {
        None
    }
}

/// surl 去掉前缀 '1'，用于 init/verify/list 等接口
pub fn short_surl(surl: &str) -> &str {
    surl.strip_prefix('1').unwrap_or(surl)
}
