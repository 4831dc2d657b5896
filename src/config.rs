//! 配置文件加载

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::provider::Provider;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub quark: QuarkConfig,
    #[serde(default)]
    pub baidu: BaiduConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuarkConfig {
    /// 完整 Cookie 字符串；为空表示夸克不可用
    #[serde(default = "default_quark_cookie")]
    pub cookie: String,
    /// 转存目标目录的 fid，"0" 为根目录
    #[serde(default = "default_quark_save_dir")]
    pub save_dir_fid: String,
    #[serde(default = "default_quark_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BaiduConfig {
    /// 至少包含 BDUSS 与 STOKEN；为空表示百度不可用
    #[serde(default = "default_baidu_cookie")]
    pub cookie: String,
    #[serde(default = "default_save_path")]
    pub save_path: String,
    #[serde(default = "default_baidu_web_base")]
    pub web_base: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// 转存后定位副本前的等待（只等一次）
    #[serde(default = "default_copy_settle_secs")]
    pub copy_settle_secs: u64,
    /// 夸克分享任务最多查询次数
    #[serde(default = "default_task_poll_limit")]
    pub task_poll_limit: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// 为空时接口不校验 token
    #[serde(default = "default_access_token")]
    pub access_token: String,
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn default_quark_cookie() -> String {
    env_or("QUARK_COOKIE", "")
}

fn default_quark_save_dir() -> String {
    "0".to_string()
}

fn default_quark_api_base() -> String {
    "https://drive-pc.quark.cn".to_string()
}

fn default_baidu_cookie() -> String {
    env_or("BAIDU_COOKIE", "")
}

fn default_save_path() -> String {
    "/我的资源".to_string()
}

fn default_baidu_web_base() -> String {
    "https://pan.baidu.com".to_string()
}

fn default_database_url() -> String {
    env_or("DATABASE_URL", "sqlite:./redistribution.db")
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_copy_settle_secs() -> u64 {
    3
}

fn default_task_poll_limit() -> u32 {
    5
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5200)
}

fn default_access_token() -> String {
    env_or("WEB_ACCESS_TOKEN", "")
}

impl Default for QuarkConfig {
    fn default() -> Self {
        Self {
            cookie: default_quark_cookie(),
            save_dir_fid: default_quark_save_dir(),
            api_base: default_quark_api_base(),
        }
    }
}

impl Default for BaiduConfig {
    fn default() -> Self {
        Self {
            cookie: default_baidu_cookie(),
            save_path: default_save_path(),
            web_base: default_baidu_web_base(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
            copy_settle_secs: default_copy_settle_secs(),
            task_poll_limit: default_task_poll_limit(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            access_token: default_access_token(),
        }
    }
}

impl Config {
    /// 文件存在则读取 TOML，否则完全从环境变量构建
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Self::parse("");
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// 某个网盘的凭证；未配置时返回 None
    pub fn credential(&self, provider: Provider) -> Option<&str> {
        let raw = match provider {
            Provider::Quark => self.quark.cookie.trim(),
            Provider::Baidu => self.baidu.cookie.trim(),
        };
        if raw.is_empty() {
            None
        } else {
            Some(raw)
        }
    }

    pub fn browser_ua() -> &'static str {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [quark]
            cookie = "__pus=abc"
            save_dir_fid = "f00d"

            [baidu]
            cookie = "BDUSS=xyz; STOKEN=123"
            save_path = "/转存"

            [pipeline]
            copy_settle_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.credential(Provider::Quark), Some("__pus=abc"));
        assert_eq!(config.quark.save_dir_fid, "f00d");
        assert_eq!(config.baidu.save_path, "/转存");
        assert_eq!(config.pipeline.copy_settle_secs, 0);
        assert_eq!(config.pipeline.http_timeout_secs, 30);
        assert_eq!(config.quark.api_base, "https://drive-pc.quark.cn");
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let config = Config::parse(
            r#"
            [quark]
            cookie = "   "
            [baidu]
            cookie = ""
            "#,
        )
        .unwrap();

        assert_eq!(config.credential(Provider::Quark), None);
        assert_eq!(config.credential(Provider::Baidu), None);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/netdisk-relay.toml").unwrap();
        assert_eq!(config.baidu.web_base, "https://pan.baidu.com");
        assert_eq!(config.pipeline.task_poll_limit, 5);
    }
}
