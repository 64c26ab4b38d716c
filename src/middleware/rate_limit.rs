//! Rate limiting middleware.
//!
//! Simple in-memory rate limiting per IP address using a fixed window.
//! Requests without connect info are not limited.

use crate::middleware::chain::{BoxHandler, Handler, Middleware};
use crate::response::{ApiError, ErrorCode, Locale};
use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request},
    http::header::RETRY_AFTER,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for rate limiting.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
    /// Burst allowance (extra requests above limit before hard reject).
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
            burst: 10,
        }
    }
}

/// Rate limiter state tracking requests per IP.
#[derive(Clone)]
pub struct RateLimit {
    config: RateLimitConfig,
    state: Arc<Mutex<HashMap<IpAddr, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Debug, PartialEq, Eq)]
enum RateLimitResult {
    Allowed,
    BurstUsed,
    Exceeded { retry_after: Duration },
}

impl RateLimit {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if request should be allowed.
    fn check(&self, ip: IpAddr, now: Instant) -> RateLimitResult {
        let mut state = self.state.lock();

        let entry = state.entry(ip).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start) >= self.config.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);

        let limit = self.config.max_requests.saturating_add(self.config.burst);
        let reset_at = entry.window_start + self.config.window;

        if entry.count > limit {
            RateLimitResult::Exceeded {
                retry_after: reset_at.saturating_duration_since(now),
            }
        } else if entry.count > self.config.max_requests {
            RateLimitResult::BurstUsed
        } else {
            RateLimitResult::Allowed
        }
    }

    /// Periodic cleanup of old entries (call from a background task).
    pub fn cleanup(&self) {
        let mut state = self.state.lock();
        let now = Instant::now();
        let window = self.config.window;

        state.retain(|_, entry| now.duration_since(entry.window_start) < window * 2);
    }

    pub fn tracked_clients(&self) -> usize {
        self.state.lock().len()
    }
}

impl Middleware for RateLimit {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(RateLimitHandler {
            limiter: self.clone(),
            next,
        })
    }
}

struct RateLimitHandler {
    limiter: RateLimit,
    next: BoxHandler,
}

#[async_trait]
impl Handler for RateLimitHandler {
    async fn call(&self, request: Request) -> Response {
        let Some(addr) = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr)
        else {
            return self.next.call(request).await;
        };
        let ip = addr.ip();

        match self.limiter.check(ip, Instant::now()) {
            RateLimitResult::Allowed => self.next.call(request).await,
            RateLimitResult::BurstUsed => {
                debug!(ip = %ip, "Rate limit burst in use");
                self.next.call(request).await
            }
            RateLimitResult::Exceeded { retry_after } => {
                warn!(
                    ip = %ip,
                    retry_after_secs = retry_after.as_secs(),
                    "Rate limit exceeded"
                );

                let locale = Locale::from_uri(request.uri());
                (
                    [(RETRY_AFTER, retry_after.as_secs().max(1).to_string())],
                    ApiError::new(ErrorCode::TooManyRequests, locale),
                )
                    .into_response()
            }
        }
    }
}
