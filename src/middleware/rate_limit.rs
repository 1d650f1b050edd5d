use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::{config::Config, error::AppError};

/// 单个客户端在窗口内的请求时间戳，按时间升序
#[derive(Debug, Default)]
pub struct ClientWindow {
    hits: VecDeque<Instant>,
}

impl ClientWindow {
    /// 移除距 `now` 已满一个窗口的时间戳
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.hits.front() {
            if now.saturating_duration_since(*oldest) >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow { remaining: u32 },
    Deny { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow { .. })
    }
}

/// 按客户端标识的滑动窗口限流器
///
/// 清理、计数、记录三步都在该标识所在分片的写锁内完成，
/// 同一客户端的并发请求不会同时越过阈值。
pub struct RateLimiter {
    windows: DashMap<String, ClientWindow>,
    max_requests: u32,
    window: Duration,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
            trust_proxy_headers: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rate_limit_requests, config.rate_limit_window())
            .trust_proxy_headers(config.trust_proxy_headers)
    }

    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn admit(&self, identity: &str, now: Instant) -> Admission {
        let mut window = match self.windows.get_mut(identity) {
            Some(window) => window,
            None => self.windows.entry(identity.to_string()).or_default(),
        };
        window.prune(now, self.window);

        let count = window.len();
        if count >= self.max_requests as usize {
            let retry_after = window
                .hits
                .front()
                .and_then(|oldest| oldest.checked_add(self.window))
                .map(|expiry| expiry.saturating_duration_since(now))
                .unwrap_or(self.window);
            return Admission::Deny { retry_after };
        }

        window.hits.push_back(now);
        Admission::Allow {
            remaining: self.max_requests - (count as u32 + 1),
        }
    }

    /// 清理窗口内已无请求的客户端，返回清理数量
    pub fn purge_idle(&self, now: Instant) -> usize {
        // 清理期间可能有新客户端插入，只统计实际移除的条目
        let mut purged = 0;
        self.windows.retain(|_, window| {
            window.prune(now, self.window);
            let keep = !window.is_empty();
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// 解析客户端标识：代理头优先，其次连接地址
    pub fn client_identity(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let forwarded = if self.trust_proxy_headers {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .or_else(|| {
                    headers
                        .get("x-forwarded-for")
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
                })
        } else {
            None
        };

        match (forwarded, peer) {
            (Some(ip), _) => ip.to_string(),
            (None, Some(addr)) => addr.ip().to_string(),
            (None, None) => "unknown".to_string(),
        }
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        let identity = self.client_identity(req.headers(), peer);

        match self.admit(&identity, Instant::now()) {
            Admission::Allow { remaining } => {
                tracing::debug!(client = %identity, remaining, "request admitted");
                next.run(req).await
            }
            Admission::Deny { retry_after } => {
                tracing::warn!(
                    client = %identity,
                    limit = self.max_requests,
                    window_secs = self.window.as_secs(),
                    "rate limit exceeded"
                );
                AppError::RateLimited { retry_after }.into_response()
            }
        }
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
