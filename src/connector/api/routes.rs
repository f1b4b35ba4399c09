use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::SessionAuth;
use crate::application::RefreshIndexUseCase;
use crate::domain::KnowledgeError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexRequest {
    workspace_path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkspacePathResponse {
    workspace_path: String,
    working_dir: String,
}

#[derive(Clone)]
pub struct ApiState {
    refresh: Arc<RefreshIndexUseCase>,
    session: Arc<dyn SessionAuth>,
}

impl ApiState {
    pub fn new(refresh: Arc<RefreshIndexUseCase>, session: Arc<dyn SessionAuth>) -> Self {
        Self { refresh, session }
    }
}

pub fn knowledge_routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/knowledge/index", post(index_workspace))
        .route("/api/knowledge/workspace-path", get(workspace_path))
        .with_state(state)
}

/// Synchronous refresh of the caller's workspace: the handler blocks until
/// the orchestrator is done. Any escape maps to a plain-text 500.
async fn index_workspace(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<IndexRequest>,
) -> Response {
    let outcome = async {
        let user_id = state
            .session
            .resolve_user(&headers)
            .ok_or(KnowledgeError::TenantMissing)?;
        let report = state
            .refresh
            .execute(&user_id, Path::new(&request.workspace_path))
            .await?;
        Ok::<_, KnowledgeError>(format!("Knowledge index refreshed: {}", report))
    }
    .await;

    match outcome {
        Ok(text) => (StatusCode::OK, text).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to refresh knowledge index: {}", e),
        )
            .into_response(),
    }
}

/// Default workspace location for the UI, derived from the server's working
/// directory.
async fn workspace_path() -> Response {
    let working_dir = std::env::current_dir()
        .map(|dir| dir.to_string_lossy().to_string())
        .unwrap_or_default();
    let workspace_path = if working_dir.is_empty() {
        "workspace".to_string()
    } else {
        std::path::PathBuf::from(&working_dir)
            .join("workspace")
            .to_string_lossy()
            .to_string()
    };

    Json(WorkspacePathResponse {
        workspace_path,
        working_dir,
    })
    .into_response()
}

pub async fn serve(state: ApiState, port: u16) -> anyhow::Result<()> {
    let app = knowledge_routes(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Knowledge API listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
