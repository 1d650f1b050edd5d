use axum::extract::{Json, Path, State};
use serde_json::{Value, json};

use crate::{
    AppState,
    cache::memo_key,
    common::DataList,
    error::AppError,
    routes::system::{InvokeRequest, invoke_cached},
};

use super::model::{DeleteResponse, Deployment, DeploymentInvokeResponse};

/// 缓存中 `get_deployment` 的操作名
const GET_DEPLOYMENT: &str = "get_deployment";

fn cache_args(deployment_id: &str) -> Value {
    json!({ "deployment_id": deployment_id })
}

/// 删除 `get_deployment` 缓存
///
/// 与进行中的未命中交错时旧值可能被写回，查询缓存因此使用 `lookup_ttl_secs`。
async fn invalidate(state: &AppState, deployment_id: &str) {
    if let Ok(key) = memo_key(GET_DEPLOYMENT, &cache_args(deployment_id)) {
        state.cache.delete(&key).await;
    }
}

#[axum::debug_handler]
pub async fn list_deployments(State(state): State<AppState>) -> Json<DataList<Deployment>> {
    tracing::info!("Listing deployments");
    Json(state.registry.list_deployments().into())
}

#[axum::debug_handler]
pub async fn create_deployment(
    State(state): State<AppState>,
    Json(deployment): Json<Deployment>,
) -> Json<Deployment> {
    tracing::info!("Creating deployment: {}", deployment.id);
    let deployment = state.registry.insert_deployment(deployment);
    invalidate(&state, &deployment.id).await;
    Json(deployment)
}

#[axum::debug_handler]
pub async fn get_deployment(
    State(state): State<AppState>,
    Path(deployment_id): Path<String>,
) -> Result<Json<Deployment>, AppError> {
    tracing::info!("Getting deployment: {}", deployment_id);
    state
        .cache
        .memoize(
            GET_DEPLOYMENT,
            &cache_args(&deployment_id),
            state.config.lookup_ttl_secs(),
            || async {
                state
                    .registry
                    .deployment(&deployment_id)
                    .ok_or(AppError::NotFound("Deployment"))
            },
        )
        .await
        .map(Json)
}

#[axum::debug_handler]
pub async fn delete_deployment(
    State(state): State<AppState>,
    Path(deployment_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    tracing::info!("Deleting deployment: {}", deployment_id);
    if !state.registry.remove_deployment(&deployment_id) {
        return Err(AppError::NotFound("Deployment"));
    }
    invalidate(&state, &deployment_id).await;
    Ok(Json(DeleteResponse {
        status: "success".to_string(),
    }))
}

#[axum::debug_handler]
pub async fn invoke_deployment(
    State(state): State<AppState>,
    Path(deployment_id): Path<String>,
    Json(req): Json<InvokeRequest>,
) -> Result<Json<DeploymentInvokeResponse>, AppError> {
    tracing::info!("Invoking deployment: {}", deployment_id);
    if state.registry.deployment(&deployment_id).is_none() {
        return Err(AppError::NotFound("Deployment"));
    }
    let result = invoke_cached(&state, req).await?;
    Ok(Json(DeploymentInvokeResponse { result }))
}
