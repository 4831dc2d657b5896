//! 网盘分享链接转存并二次分享（夸克 / 百度）
//!
//! 给定第三方分享链接，转存到自己的网盘并生成新的分享链接；
//! 结果记录在缓存中，同一链接不会重复转存。

pub mod baidupcs;
pub mod cache;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod quark;
pub mod state;
pub mod web;

pub use cache::{RedistributionCache, RedistributionRecord};
pub use config::Config;
pub use error::{ErrorKind, PipelineOutcome, RelayError};
pub use orchestrator::Orchestrator;
pub use provider::{Provider, ShareReference};
pub use state::AppState;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
