//! Gatekeeper Backend Library
//!
//! Password login, stateless JWT sessions, and ordered middleware chains for
//! axum routes. The binary in `main.rs` only wires configuration to `app`.

pub mod app;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod response;
