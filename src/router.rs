use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    AppState,
    middleware::{RateLimiter, log_errors, rate_limit},
    routes::{assistant, deployment, platform, system, thread},
};

// 助手相关的路由
fn assistant_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/assistants",
            get(assistant::list_assistants).post(assistant::create_assistant),
        )
        .route("/v1/assistants/{assistant_id}", get(assistant::get_assistant))
}

// 线程、消息和运行相关的路由
fn thread_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/threads", post(thread::create_thread))
        .route("/v1/threads/{thread_id}", get(thread::get_thread))
        .route(
            "/v1/threads/{thread_id}/messages",
            get(thread::list_messages).post(thread::create_message),
        )
        .route("/v1/threads/{thread_id}/runs", post(thread::create_run))
        .route("/v1/threads/{thread_id}/runs/{run_id}", get(thread::get_run))
}

// 部署相关的路由
fn deployment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/deployments",
            get(deployment::list_deployments).post(deployment::create_deployment),
        )
        .route(
            "/deployments/{deployment_id}",
            get(deployment::get_deployment).delete(deployment::delete_deployment),
        )
        .route(
            "/deployments/{deployment_id}/invoke",
            post(deployment::invoke_deployment),
        )
}

// 平台兼容路由
fn platform_routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", get(platform::get_tenants))
        .route("/tenants/current/usage_limits", get(platform::get_usage_limits))
        .route("/workspaces", get(platform::get_workspaces))
        .route("/workspaces/current/tags", get(platform::get_workspace_tags))
        .route("/workspaces/current/stats", get(platform::get_workspace_stats))
        .route("/orgs/current/info", get(platform::get_org_info))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers(Any)
        .expose_headers(Any)
        .max_age(Duration::from_secs(1800))
}

/// 创建主路由：限流在最外层（CORS 之内），其后是请求日志
pub fn create_router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/v1/health", get(system::health_check))
        .route("/v1/invoke", post(system::invoke))
        .merge(assistant_routes())
        .merge(thread_routes())
        .merge(deployment_routes())
        .merge(platform_routes())
        .layer(from_fn(log_errors))
        .layer(from_fn_with_state(limiter, rate_limit))
        .layer(cors_layer())
        .with_state(state)
}
