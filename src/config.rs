//! Service configuration
//!
//! Values come from CLI flags with environment fallback. `.env` files are
//! loaded first by [`load_env`]. Everything here is read once at startup and
//! handed to components explicitly.

use crate::auth::jwt::{SigningSecret, TokenConfig};
use crate::middleware::rate_limit::RateLimitConfig;
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration faults. All of them are fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT signing secret is missing or empty")]
    MissingSecret,
    #[error("token validity must be at least one second (got {0}s)")]
    InvalidValidity(u64),
}

#[derive(Parser, Debug, Clone)]
#[command(name = "gatekeeper")]
#[command(about = "Authentication service: password login, JWT issuance and guarded routes")]
pub struct AppConfig {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    /// SQLite database holding user accounts
    #[arg(long, env = "AUTH_DB_PATH", default_value = "gatekeeper_auth.db")]
    pub auth_db_path: String,

    /// HMAC secret used to sign access tokens (>= 32 bytes recommended)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    #[arg(long, env = "JWT_EXPIRES_AT", default_value = "3600")]
    pub jwt_expires_at: u64,

    /// bcrypt cost for newly created accounts
    #[arg(long, env = "BCRYPT_COST", default_value = "12")]
    pub bcrypt_cost: u32,

    /// Bootstrap admin account, created if it does not exist
    #[arg(long, env = "ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Login attempts allowed per client IP per minute
    #[arg(long, env = "LOGIN_RATE_LIMIT", default_value = "30")]
    pub login_rate_limit: u32,

    /// Extra attempts tolerated above the limit
    #[arg(long, env = "LOGIN_RATE_BURST", default_value = "10")]
    pub login_rate_burst: u32,
}

impl AppConfig {
    pub fn token_config(&self) -> Result<TokenConfig, ConfigError> {
        // The key is used byte for byte; only an all-blank value is refused
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        let secret = SigningSecret::new(self.jwt_secret.as_bytes().to_vec())?;
        TokenConfig::new(secret, Duration::from_secs(self.jwt_expires_at))
    }

    pub fn login_rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.login_rate_limit,
            window: Duration::from_secs(60),
            burst: self.login_rate_burst,
        }
    }

    /// Bootstrap credentials, only when both halves are set
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some((user.as_str(), pass.as_str()))
            }
            _ => None,
        }
    }
}

pub fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate root, for runs started elsewhere with --manifest-path
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
