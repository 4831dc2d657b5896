//! 错误类型
//!
//! 转存流水线中每一步的失败都归入一个 [`ErrorKind`]，并附带服务端原始信息。

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 链接格式不符合该网盘的分享链接
    MalformedLink,
    /// 运营方登录凭证缺失或已过期
    AuthRequired,
    /// 提取码错误，或分享已失效/被取消
    AccessDenied,
    /// 分享内没有任何文件
    EmptyShare,
    /// 转存请求被服务端拒绝
    CopyRejected,
    /// 转存后在自己的网盘中找不到副本
    CopyNotFound,
    /// 创建新分享失败
    ShareCreationFailed,
    /// 网络错误、超时、响应无法解析
    TransportError,
    /// 未配置该网盘的凭证
    CredentialMissing,
    /// 缓存存储读写失败
    Storage,
    /// 调用 HTTP 接口时访问令牌错误（与网盘登录状态无关）
    InvalidAccessToken,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedLink => "MalformedLink",
            ErrorKind::AuthRequired => "AuthRequired",
            ErrorKind::AccessDenied => "AccessDenied",
            ErrorKind::EmptyShare => "EmptyShare",
            ErrorKind::CopyRejected => "CopyRejected",
            ErrorKind::CopyNotFound => "CopyNotFound",
            ErrorKind::ShareCreationFailed => "ShareCreationFailed",
            ErrorKind::TransportError => "TransportError",
            ErrorKind::CredentialMissing => "CredentialMissing",
            ErrorKind::Storage => "Storage",
            ErrorKind::InvalidAccessToken => "InvalidAccessToken",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 流水线错误：分类 + 可读的详情（通常是服务端自己的错误信息）
#[derive(Debug, Clone, Error)]
#[error("{kind}: {detail}")]
pub struct RelayError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl RelayError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedLink, detail)
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportError, detail)
    }
}

/// 单次转存的结果；`Ok` 为新分享链接
pub type PipelineOutcome = Result<String, RelayError>;

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::transport(format!("请求超时: {}", err))
        } else if let Some(status) = err.status() {
            RelayError::transport(format!("HTTP {}: {}", status.as_u16(), err))
        } else {
            RelayError::transport(format!("网络错误: {}", err))
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::transport(format!("响应解析失败: {}", err))
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> Self {
        RelayError::new(ErrorKind::Storage, format!("缓存存储错误: {}", err))
    }
}
