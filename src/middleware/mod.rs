//! Request middleware and the chain that composes it.
//!
//! This module provides:
//! - The `Handler`/`Middleware` traits and `MiddlewareChain`
//! - Request logging with latency tracking
//! - Rate limiting per IP address

pub mod chain;
pub mod logging;
pub mod rate_limit;

pub use chain::{endpoint, BoxHandler, ChainService, Handler, Middleware, MiddlewareChain};
pub use logging::RequestLogging;
pub use rate_limit::{RateLimit, RateLimitConfig};
