//! Web 服务器模块
//!
//! 给前端/调用方提供 JSON 接口：提交一个分享链接，返回新分享链接或错误分类。

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::error::{ErrorKind, RelayError};
use crate::provider::{Provider, ShareReference};
use crate::{AppState, Orchestrator};

#[derive(Clone)]
pub struct WebState {
    pub app: Arc<AppState>,
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct RedistributeRequest {
    pub share_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pwd: Option<String>,
    /// 省略时按域名识别
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RedistributeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl RedistributeResponse {
    fn ok(url: String) -> Self {
        Self {
            success: true,
            url: Some(url),
            error: None,
        }
    }

    fn err(e: RelayError) -> Self {
        Self {
            success: false,
            url: None,
            error: Some(ErrorBody {
                kind: e.kind,
                message: e.detail,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

/// 健康检查端点
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION,
    })
}

/// 转存 API 端点
///
/// 访问令牌错误返回 401；转存本身的失败仍是 200 + `success: false`。
pub async fn redistribute_handler(
    State(state): State<WebState>,
    Json(req): Json<RedistributeRequest>,
) -> (StatusCode, Json<RedistributeResponse>) {
    let expected = &state.app.config.web.access_token;
    if !expected.is_empty() && &req.token != expected {
        warn!("❌ 访问令牌错误");
        let err = RelayError::new(ErrorKind::InvalidAccessToken, "访问令牌错误");
        return (StatusCode::UNAUTHORIZED, Json(RedistributeResponse::err(err)));
    }

    info!("📥 收到转存请求: {}", req.share_url);

    let share = match build_reference(req) {
        Ok(share) => share,
        Err(e) => {
            warn!("❌ 请求参数无效: {}", e);
            return (StatusCode::OK, Json(RedistributeResponse::err(e)));
        }
    };

    match state.orchestrator.resolve(&share).await {
        Ok(url) => (StatusCode::OK, Json(RedistributeResponse::ok(url))),
        Err(e) => (StatusCode::OK, Json(RedistributeResponse::err(e))),
    }
}

fn build_reference(req: RedistributeRequest) -> Result<ShareReference, RelayError> {
    let provider = validate_share_url(&req.share_url, req.provider)?;
    let pwd = req.pwd.filter(|p| !p.trim().is_empty());
    if let Some(pwd) = &pwd {
        validate_password(provider, pwd)?;
    }
    let title = if req.title.trim().is_empty() {
        "分享".to_string()
    } else {
        req.title
    };
    Ok(ShareReference::new(req.share_url.trim(), title, pwd, provider))
}

/// 验证分享链接格式，返回所属网盘
pub fn validate_share_url(url: &str, provider: Option<Provider>) -> Result<Provider, RelayError> {
    if url.trim().is_empty() {
        return Err(RelayError::malformed("分享链接不能为空"));
    }

    let parsed = Url::parse(url.trim()).map_err(|_| RelayError::malformed("无效的 URL 格式"))?;

    if !parsed.path().starts_with("/s/") && !parsed.path().starts_with("/share/init") {
        return Err(RelayError::malformed("无效的分享链接格式，应包含 /s/"));
    }

    match (provider, Provider::detect(url)) {
        (Some(p), _) => Ok(p),
        (None, Some(p)) => Ok(p),
        (None, None) => Err(RelayError::malformed("无法识别网盘类型")),
    }
}

/// 百度网盘提取码必须是4位字符
pub fn validate_password(provider: Provider, pwd: &str) -> Result<(), RelayError> {
    if provider == Provider::Baidu && pwd.chars().count() != 4 {
        return Err(RelayError::malformed("提取码必须是4位字符"));
    }
    Ok(())
}

/// 创建 Web 路由
pub fn create_router(app: Arc<AppState>, orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/redistribute", post(redistribute_handler))
        .with_state(WebState { app, orchestrator })
}
