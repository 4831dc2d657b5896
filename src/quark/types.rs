//! 夸克接口数据类型

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ErrorKind, RelayError};

/// 夸克接口统一的响应外壳
#[derive(Debug, Deserialize)]
pub struct QuarkResponse<T> {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> QuarkResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.code == 0 && (self.status == 0 || self.status == 200)
    }

    /// 未登录或 Cookie 过期
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.code == 31001
    }

    pub fn describe(&self) -> String {
        format!("code={}, status={}, message={}", self.code, self.status, self.message)
    }

    /// 成功则取出 data，否则按给定分类报错
    pub fn into_data(self, kind: ErrorKind, step: &str) -> Result<T, RelayError> {
        if self.is_auth_error() {
            return Err(RelayError::new(
                ErrorKind::AuthRequired,
                format!("{}: 夸克登录已失效 ({})", step, self.describe()),
            ));
        }
        if !self.is_ok() {
            return Err(RelayError::new(kind, format!("{}: {}", step, self.describe())));
        }
        let detail = format!("{}: 响应缺少 data ({})", step, self.describe());
        self.data.ok_or_else(|| RelayError::transport(detail))
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenData {
    pub stoken: String,
}

#[derive(Debug, Deserialize)]
pub struct DetailData {
    #[serde(default)]
    pub list: Vec<SharedItem>,
}

/// 分享中的一个文件/目录
#[derive(Debug, Clone, Deserialize)]
pub struct SharedItem {
    pub fid: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub share_fid_token: String,
    #[serde(default)]
    pub dir: bool,
}

#[derive(Debug, Deserialize)]
pub struct TaskIdData {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskData {
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub share_id: Option<String>,
}

impl TaskData {
    pub const DONE: i32 = 2;
}

#[derive(Debug, Deserialize)]
pub struct SortData {
    #[serde(default)]
    pub list: Vec<DriveItem>,
}

/// 自己网盘中的文件
#[derive(Debug, Clone, Deserialize)]
pub struct DriveItem {
    pub fid: String,
    #[serde(default)]
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SharePasswordData {
    pub share_url: String,
}

/// 分享链接类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UrlType {
    /// 公开，无需提取码
    Public = 1,
    /// 需要提取码
    Private = 2,
}

/// 分享有效期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExpiredType {
    Permanent = 1,
    OneDay = 2,
    SevenDays = 3,
    ThirtyDays = 4,
}

impl Serialize for UrlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl Serialize for ExpiredType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// 创建分享的请求体
#[derive(Debug, Serialize)]
pub struct CreateShareRequest<'a> {
    pub fid_list: Vec<&'a str>,
    pub title: &'a str,
    pub url_type: UrlType,
    pub expired_type: ExpiredType,
}
