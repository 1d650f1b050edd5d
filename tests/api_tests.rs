use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agent_gateway::{
    AppState,
    cache::{MemoryStore, ResponseCache},
    config::Config,
    llm::{ChatMessage, EchoResponder, Responder, ResponderError},
    middleware::RateLimiter,
    registry::Registry,
    router::create_router,
    routes::assistant::{Assistant, DEFAULT_ASSISTANT_ID},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// 记录调用次数的回显响应器
#[derive(Default)]
struct CountingResponder {
    calls: AtomicUsize,
}

#[async_trait]
impl Responder for CountingResponder {
    async fn respond(&self, history: &[ChatMessage]) -> Result<ChatMessage, ResponderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EchoResponder.respond(history).await
    }
}

/// 总是返回上游错误的响应器
struct FailingResponder {
    status: u16,
    body: String,
}

impl FailingResponder {
    fn overloaded() -> Self {
        Self {
            status: 503,
            body: "overloaded".to_string(),
        }
    }
}

#[async_trait]
impl Responder for FailingResponder {
    async fn respond(&self, _history: &[ChatMessage]) -> Result<ChatMessage, ResponderError> {
        Err(ResponderError::Provider {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

fn build_app(cache: ResponseCache, responder: Arc<dyn Responder>, limiter: RateLimiter) -> Router {
    let state = AppState {
        config: Config::default(),
        cache,
        registry: Arc::new(Registry::new()),
        responder,
    };
    create_router(state, Arc::new(limiter))
}

fn default_app() -> Router {
    build_app(
        ResponseCache::disabled(),
        Arc::new(EchoResponder),
        RateLimiter::new(1000, Duration::from_secs(60)),
    )
}

fn cached_app(responder: Arc<dyn Responder>) -> Router {
    build_app(
        ResponseCache::with_store(Arc::new(MemoryStore::new())),
        responder,
        RateLimiter::new(1000, Duration::from_secs(60)),
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_check() {
    let app = default_app();
    let (status, body) = send(&app, get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn default_assistant_is_listed_and_fetchable() {
    let app = default_app();
    let (status, body) = send(&app, get("/v1/assistants")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "asst_default");

    let (status, body) = send(&app, get("/v1/assistants/asst_default")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Simple Chat Assistant");
}

#[tokio::test]
async fn unknown_assistant_is_404() {
    let app = cached_app(Arc::new(EchoResponder));
    let (status, body) = send(&app, get("/v1/assistants/asst_missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Assistant not found"}));
}

#[tokio::test]
async fn cached_assistant_is_refreshed_when_overwritten() {
    let app = cached_app(Arc::new(EchoResponder));
    send(&app, post_json("/v1/assistants", json!({"id": "asst_x", "name": "First"}))).await;
    let (_, first) = send(&app, get("/v1/assistants/asst_x")).await;
    assert_eq!(first["name"], "First");

    let (_, again) = send(&app, get("/v1/assistants/asst_x")).await;
    assert_eq!(again, first);

    send(&app, post_json("/v1/assistants", json!({"id": "asst_x", "name": "Second"}))).await;
    let (_, refreshed) = send(&app, get("/v1/assistants/asst_x")).await;
    assert_eq!(refreshed["name"], "Second");
}

#[tokio::test(start_paused = true)]
async fn stale_lookup_expires_after_lookup_ttl() {
    let registry = Arc::new(Registry::new());
    let state = AppState {
        config: Config::default(),
        cache: ResponseCache::with_store(Arc::new(MemoryStore::new())),
        registry: Arc::clone(&registry),
        responder: Arc::new(EchoResponder),
    };
    let lookup_ttl = state.config.lookup_ttl_secs();
    let app = create_router(state, Arc::new(RateLimiter::new(1000, Duration::from_secs(60))));
    let uri = format!("/v1/assistants/{DEFAULT_ASSISTANT_ID}");

    let (_, original) = send(&app, get(&uri)).await;

    // 绕过失效逻辑直接改写，相当于失效后又被旧值写回
    let renamed: Assistant =
        serde_json::from_value(json!({"id": DEFAULT_ASSISTANT_ID, "name": "Renamed"})).unwrap();
    registry.insert_assistant(renamed);
    let (_, stale) = send(&app, get(&uri)).await;
    assert_eq!(stale, original);

    tokio::time::advance(Duration::from_secs(lookup_ttl + 1)).await;
    let (_, fresh) = send(&app, get(&uri)).await;
    assert_eq!(fresh["name"], "Renamed");
}

#[tokio::test]
async fn chat_flow_appends_reply_and_records_run() {
    let app = default_app();
    let (status, thread) = send(
        &app,
        post_json("/v1/threads", json!({"assistant_id": "asst_default", "metadata": {"test": true}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let thread_id = thread["id"].as_str().unwrap().to_string();
    assert!(thread_id.starts_with("thread_"));

    let (status, message) = send(
        &app,
        post_json(
            &format!("/v1/threads/{thread_id}/messages"),
            json!({"role": "user", "content": "What is a sliding window?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message["thread_id"], thread_id.as_str());

    let (status, run) = send(&app, post_json(&format!("/v1/threads/{thread_id}/runs"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], "completed");
    let run_id = run["id"].as_str().unwrap();

    let (status, fetched) = send(&app, get(&format!("/v1/threads/{thread_id}/runs/{run_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "completed");

    let (_, messages) = send(&app, get(&format!("/v1/threads/{thread_id}/messages"))).await;
    let data = messages["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[1]["role"], "assistant");
    assert_eq!(data[1]["content"], "You said: What is a sliding window?");
}

#[tokio::test]
async fn failed_responder_marks_run_failed() {
    let app = build_app(
        ResponseCache::disabled(),
        Arc::new(FailingResponder::overloaded()),
        RateLimiter::new(1000, Duration::from_secs(60)),
    );
    let (_, thread) = send(&app, post_json("/v1/threads", json!({"assistant_id": "asst_default"}))).await;
    let thread_id = thread["id"].as_str().unwrap();

    let (status, run) = send(&app, post_json(&format!("/v1/threads/{thread_id}/runs"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["status"], "failed");
    assert!(run["last_error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn thread_routes_404_for_unknown_thread() {
    let app = default_app();
    let (status, _) = send(&app, get("/v1/threads/thread_missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        post_json("/v1/threads/thread_missing/messages", json!({"role": "user", "content": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Thread not found");

    let (status, _) = send(&app, get("/v1/threads/thread_missing/runs/run_1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invoke_is_memoized_when_cache_enabled() {
    let responder = Arc::new(CountingResponder::default());
    let app = cached_app(responder.clone());

    let request = json!({"messages": [{"role": "user", "content": "hello"}]});
    let (status, first) = send(&app, post_json("/v1/invoke", request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, post_json("/v1/invoke", request)).await;

    assert_eq!(first, second);
    assert_eq!(first["messages"][1]["content"], "You said: hello");
    assert_eq!(responder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invoke_without_cache_always_calls_responder() {
    let responder = Arc::new(CountingResponder::default());
    let app = build_app(
        ResponseCache::disabled(),
        responder.clone(),
        RateLimiter::new(1000, Duration::from_secs(60)),
    );

    for _ in 0..3 {
        let (status, _) = send(&app, post_json("/v1/invoke", json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(responder.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn invoke_with_no_messages_is_rejected() {
    let app = default_app();
    let (status, body) = send(&app, post_json("/v1/invoke", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No messages to respond to");
}

#[tokio::test]
async fn invoke_provider_error_is_500() {
    let app = build_app(
        ResponseCache::disabled(),
        Arc::new(FailingResponder::overloaded()),
        RateLimiter::new(1000, Duration::from_secs(60)),
    );
    let (status, body) = send(&app, post_json("/v1/invoke", json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("overloaded"));
}

#[tokio::test]
async fn large_provider_error_body_reaches_client() {
    let app = build_app(
        ResponseCache::disabled(),
        Arc::new(FailingResponder {
            status: 502,
            body: "x".repeat(5000),
        }),
        RateLimiter::new(1000, Duration::from_secs(60)),
    );
    let (status, body) = send(&app, post_json("/v1/invoke", json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("502"));
    assert!(detail.len() > 5000);
}

#[tokio::test]
async fn deleting_deployment_invalidates_cached_lookup() {
    let app = cached_app(Arc::new(EchoResponder));
    let (status, created) = send(&app, post_json("/deployments", json!({"name": "prod"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "active");
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("deployment_"));

    let (status, _) = send(&app, get(&format!("/deployments/{id}"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, delete(&format!("/deployments/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));

    let (status, _) = send(&app, get(&format!("/deployments/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, delete(&format!("/deployments/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deployment_invoke_wraps_result() {
    let app = default_app();
    let (_, created) = send(&app, post_json("/deployments", json!({"name": "prod"}))).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        post_json(&format!("/deployments/{id}/invoke"), json!({"message": "ping"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["messages"][1]["content"], "You said: ping");

    let (status, _) = send(
        &app,
        post_json("/deployments/deployment_missing/invoke", json!({"message": "ping"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn platform_endpoints_respond() {
    let app = default_app();
    let (status, body) = send(&app, get("/tenants/current/usage_limits")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_exceeded_limit"], false);

    let (_, body) = send(&app, get("/orgs/current/info")).await;
    assert_eq!(body["settings"]["allow_token_sharing"], true);

    let (_, body) = send(&app, get("/workspaces/current/stats")).await;
    assert_eq!(body["total_runs"], 0);
}

#[tokio::test]
async fn third_request_in_window_is_rate_limited() {
    let app = build_app(
        ResponseCache::disabled(),
        Arc::new(EchoResponder),
        RateLimiter::new(2, Duration::from_secs(60)),
    );
    let from = |ip: &'static str| {
        Request::get("/v1/health")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(from("203.0.113.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(from("203.0.113.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"Rate limit exceeded");

    // 其他客户端不受影响
    let response = app.clone().oneshot(from("198.51.100.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
