use axum::extract::{Json, Path, State};
use serde_json::json;

use crate::{AppState, common::DataList, error::AppError};

use super::model::Assistant;

/// 缓存中 `get_assistant` 的操作名
const GET_ASSISTANT: &str = "get_assistant";

#[axum::debug_handler]
pub async fn list_assistants(State(state): State<AppState>) -> Json<DataList<Assistant>> {
    tracing::info!("Listing assistants");
    Json(state.registry.list_assistants().into())
}

#[axum::debug_handler]
pub async fn create_assistant(
    State(state): State<AppState>,
    Json(assistant): Json<Assistant>,
) -> Json<Assistant> {
    tracing::info!("Creating assistant: {}", assistant.id);
    let args = json!({ "assistant_id": assistant.id });
    let assistant = state.registry.insert_assistant(assistant);
    // 可能覆盖了同 ID 的旧助手；与进行中的未命中交错时，旧值最多保留 lookup_ttl_secs
    if let Ok(key) = crate::cache::memo_key(GET_ASSISTANT, &args) {
        state.cache.delete(&key).await;
    }
    Json(assistant)
}

#[axum::debug_handler]
pub async fn get_assistant(
    State(state): State<AppState>,
    Path(assistant_id): Path<String>,
) -> Result<Json<Assistant>, AppError> {
    tracing::info!("Getting assistant: {}", assistant_id);
    state
        .cache
        .memoize(
            GET_ASSISTANT,
            &json!({ "assistant_id": assistant_id }),
            state.config.lookup_ttl_secs(),
            || async {
                state
                    .registry
                    .assistant(&assistant_id)
                    .ok_or(AppError::NotFound("Assistant"))
            },
        )
        .await
        .map(Json)
}
