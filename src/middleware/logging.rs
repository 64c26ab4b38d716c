//! Request logging middleware.
//!
//! Logs every HTTP request with method, path, status code, and latency.

use crate::middleware::chain::{BoxHandler, Handler, Middleware};
use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request},
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Instrument};

/// Logs at INFO level for completed requests, WARN level for 5xx.
/// Includes: method, path, status code, latency in milliseconds, and the
/// client address when the server was started with connect info.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogging;

impl Middleware for RequestLogging {
    fn name(&self) -> &'static str {
        "request_logging"
    }

    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(RequestLoggingHandler { next })
    }
}

struct RequestLoggingHandler {
    next: BoxHandler,
}

#[async_trait]
impl Handler for RequestLoggingHandler {
    async fn call(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        // Skip logging for health checks to reduce noise
        if path == "/health" {
            return self.next.call(request).await;
        }

        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_string());

        let span = tracing::info_span!(
            "http_request",
            method = %method,
            path = %path,
            client_ip = %client_ip,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        );

        let start = Instant::now();
        let response = self.next.call(request).instrument(span.clone()).await;
        let latency = start.elapsed();
        let status = response.status().as_u16();

        span.record("status", status);
        span.record("latency_ms", latency.as_millis() as u64);

        if status >= 500 {
            warn!(
                parent: &span,
                method = %method,
                path = %path,
                status = status,
                latency_ms = latency.as_millis() as u64,
                "Request failed (5xx)"
            );
        } else {
            info!(
                parent: &span,
                method = %method,
                path = %path,
                status = status,
                latency_ms = latency.as_millis() as u64,
                "Request completed"
            );
        }

        response
    }
}
