use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_gateway::{
    AppState, cache::ResponseCache, config::Config, llm, middleware::RateLimiter,
    registry::Registry, router::create_router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env();

    // 启动时决定一次是否启用缓存
    let cache = ResponseCache::from_config(&config).await;

    let responder = llm::from_config(&config).expect("Failed to build model responder");

    // 设置应用状态
    let state = AppState {
        config: config.clone(),
        cache,
        registry: Arc::new(Registry::new()),
        responder,
    };

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::from_config(&config));
    tracing::info!(
        "Rate limit: {} requests per {}s",
        config.rate_limit_requests,
        config.rate_limit_window_secs
    );

    // 定期清理空闲客户端窗口
    {
        let limiter = Arc::clone(&rate_limiter);
        tokio::spawn(async move {
            let period = limiter.window().clamp(Duration::from_secs(1), Duration::from_secs(3600));
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let purged = limiter.purge_idle(Instant::now());
                if purged > 0 {
                    tracing::debug!("Purged {} idle rate limit windows", purged);
                }
            }
        });
    }

    let app = create_router(state, rate_limiter);

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
