use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netdisk_relay::{
    config::Config, AppState, Orchestrator, Provider, RedistributionCache, ShareReference,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netdisk_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 用法：netdisk-relay <share_url> [title] [pwd] [provider]
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        return Err(anyhow!(
            "用法: {} <share_url> [title] [pwd] [quark|baidu]",
            args.first()
                .map(|s| s.as_str())
                .unwrap_or("netdisk-relay")
        ));
    }

    let share_url = args[1].clone();
    let title = args.get(2).cloned().unwrap_or_else(|| "分享".to_string());
    let pwd = args.get(3).cloned().filter(|p| !p.is_empty());
    let provider = match args.get(4) {
        Some(p) => p.parse::<Provider>()?,
        None => Provider::detect(&share_url)
            .ok_or_else(|| anyhow!("无法识别网盘类型: {}", share_url))?,
    };

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load(&config_path)?;
    if std::path::Path::new(&config_path).exists() {
        tracing::info!("✅ 配置加载完成: {}", config_path);
    } else {
        tracing::info!("✅ 配置从环境变量加载");
    }

    let cache = RedistributionCache::connect(&config.cache.database_url).await?;
    let state = Arc::new(AppState::new(config)?);
    let orchestrator = Orchestrator::from_state(state, cache);

    let share = ShareReference::new(share_url, title, pwd, provider);
    match orchestrator.resolve(&share).await {
        Ok(url) => {
            println!("{}", url);
            Ok(())
        }
        Err(e) => Err(anyhow!("[{}] {}", e.kind, e.detail)),
    }
}
