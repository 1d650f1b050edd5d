use axum::extract::{Json, State};

use crate::{AppState, error::AppError, llm::ChatMessage};

use super::model::{HealthResponse, InvokeRequest, InvokeResponse, RootResponse};

/// 缓存中 `invoke` 的操作名
const INVOKE: &str = "invoke";

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Agent Gateway API Server",
    })
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[axum::debug_handler]
pub async fn invoke(
    State(state): State<AppState>,
    Json(req): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, AppError> {
    tracing::info!("Invoking responder");
    invoke_cached(&state, req).await.map(Json)
}

/// 对请求中的历史调用响应器，按请求内容缓存
pub(crate) async fn invoke_cached(
    state: &AppState,
    req: InvokeRequest,
) -> Result<InvokeResponse, AppError> {
    state
        .cache
        .memoize(INVOKE, &req, state.config.cache_ttl_secs, || async {
            let mut messages = req.history();
            if messages.is_empty() {
                return Err(AppError::BadRequest("No messages to respond to"));
            }
            let reply: ChatMessage = state.responder.respond(&messages).await.map_err(|e| {
                tracing::error!("Error in invoke: {}", e);
                AppError::from(e)
            })?;
            messages.push(reply);
            Ok(InvokeResponse { messages })
        })
        .await
}
