//! 数据类型

use serde::{Deserialize, Deserializer};

use crate::error::{ErrorKind, RelayError};

/// 分享页面上提取的信息
#[derive(Debug, Clone)]
pub struct SharePage {
    pub shareid: String,
    pub uk: String,
}

/// 分享中的一个文件/目录
#[derive(Debug, Clone, Deserialize)]
pub struct ShareFileItem {
    // 百度接口字段名可能是 fs_id 或 fsid，且值可能是字符串或数字
    #[serde(rename = "fs_id", alias = "fsid", deserialize_with = "string_or_u64")]
    pub fs_id: u64,
    #[serde(default)]
    pub server_filename: String,
}

/// 自定义反序列化：支持字符串或数字类型的 fsid
pub(crate) fn string_or_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrU64 {
        Str(String),
        Num(u64),
    }

    match StringOrU64::deserialize(deserializer)? {
        StringOrU64::Str(s) => s.parse().map_err(Error::custom),
        StringOrU64::Num(n) => Ok(n),
    }
}

/// 按 errno 归类错误；未知 errno 使用 `fallback`
pub(crate) fn errno_error(errno: i32, step: &str, msg: &str, fallback: ErrorKind) -> RelayError {
    let (kind, hint) = match errno {
        -6 => (ErrorKind::AuthRequired, "身份验证失败，请检查 BDUSS/STOKEN"),
        -7 => (ErrorKind::AccessDenied, "分享链接已过期或被删除"),
        -9 | -12 => (ErrorKind::AccessDenied, "提取码错误"),
        -19 | -62 => (ErrorKind::AccessDenied, "需要输入验证码"),
        105 => (ErrorKind::AccessDenied, "分享链接不存在"),
        110 => (ErrorKind::AccessDenied, "分享链接已失效"),
        _ => (fallback, "未知错误"),
    };
    RelayError::new(
        kind,
        format!(
            "{}: errno={}, {}{}{}",
            step,
            errno,
            hint,
            if msg.is_empty() { "" } else { ", " },
            msg
        ),
    )
}
