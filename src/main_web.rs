//! Web 服务器入口点

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netdisk_relay::{config::Config, web, AppState, Orchestrator, Provider, RedistributionCache};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netdisk_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 网盘转存 Web 服务器启动中...");

    // 加载配置（支持环境变量 CONFIG_PATH 或命令行参数）
    let config_path = std::env::var("CONFIG_PATH")
        .ok()
        .or_else(|| std::env::args().nth(1))
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)?;
    if std::path::Path::new(&config_path).exists() {
        tracing::info!("✅ 配置加载完成: {}", config_path);
    } else {
        tracing::info!("✅ 配置从环境变量加载");
    }

    let port = config.web.port;
    let cache = RedistributionCache::connect(&config.cache.database_url).await?;
    let state = Arc::new(AppState::new(config)?);
    let orchestrator = Orchestrator::from_state(state.clone(), cache);

    for provider in [Provider::Quark, Provider::Baidu] {
        if orchestrator.is_available(provider) {
            tracing::info!("✅ {} 已配置", provider);
        } else {
            tracing::warn!("⚠️ {} 未配置凭证，相关请求将返回 CredentialMissing", provider);
        }
    }

    let app = web::create_router(state, Arc::new(orchestrator));

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("🌐 Web 服务器启动在: http://{}", addr);
    tracing::info!("💚 健康检查: http://localhost:{}/health", port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
