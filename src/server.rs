use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::error::HookError;
use crate::hooks::{GitHook, GitHubFormHook, GitHubJsonHook};

#[derive(Debug, Clone)]
pub struct AppState {
    pub json_hook: GitHubJsonHook,
    pub form_hook: GitHubFormHook,
    pub ssh_url_prefix: Option<String>,
}

impl AppState {
    pub fn new(ssh_url_prefix: Option<String>, max_body_bytes: usize) -> Self {
        Self {
            json_hook: GitHubJsonHook::new(max_body_bytes),
            form_hook: GitHubFormHook::new(max_body_bytes),
            ssh_url_prefix,
        }
    }
}

#[derive(Debug, Serialize)]
struct UriResponse {
    uri: String,
}

/// A [`HookError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(HookError);

impl From<HookError> for ApiError {
    fn from(e: HookError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            HookError::BodyRead(_) | HookError::FormParse { .. } | HookError::JsonParse(_) => {
                StatusCode::BAD_REQUEST
            }
            HookError::MissingUrl | HookError::InvalidRepoUrl { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            HookError::JsonEncode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, error = %self.0, "rejected webhook");
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn repo_uri<H: GitHook + Sync>(
    hook: &H,
    req: Request,
) -> Result<Json<UriResponse>, ApiError> {
    let uri = hook.git_repo_uri(req).await?;
    info!(%uri, "resolved repository uri");
    Ok(Json(UriResponse { uri }))
}

async fn handle_json_hook(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Json<UriResponse>, ApiError> {
    repo_uri(&state.json_hook, req).await
}

async fn handle_form_hook(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Json<UriResponse>, ApiError> {
    repo_uri(&state.form_hook, req).await
}

async fn handle_form_rewrite(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Response, ApiError> {
    let Some(prefix) = state.ssh_url_prefix.as_deref() else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no ssh url prefix configured" })),
        )
            .into_response());
    };

    let rewritten = state.form_hook.replace_ssh_uri(req, prefix).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], rewritten).into_response())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hookuri",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn service_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "GitHub webhook repository URI resolver",
        "endpoints": {
            "json": "/hooks/github/json",
            "form": "/hooks/github/form",
            "rewrite": "/hooks/github/form/rewrite",
            "health": "/health",
            "info": "/"
        },
        "rewrite_enabled": state.ssh_url_prefix.is_some()
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/hooks/github/json", post(handle_json_hook))
        .route("/hooks/github/form", post(handle_form_hook))
        .route("/hooks/github/form/rewrite", post(handle_form_rewrite))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
