//! Router wiring.
//!
//! Each route gets its middleware from a [`MiddlewareChain`] built once here;
//! only CORS is applied as a router-wide tower layer.

use crate::auth::{api as auth_api, AuthState, Authenticate, Authenticator, JwtHandler, UserStore};
use crate::config::AppConfig;
use crate::middleware::{endpoint, Middleware, MiddlewareChain, RateLimit, RequestLogging};
use anyhow::{Context, Result};
use axum::{
    routing::{get, get_service, post_service},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Everything the router needs, built from configuration
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub login_limit: RateLimit,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let token_config = config
            .token_config()
            .context("Invalid token configuration")?;

        let user_store = UserStore::new(&config.auth_db_path, config.bcrypt_cost)?;
        if let Some((username, password)) = config.admin_credentials() {
            user_store.ensure_admin(username, password)?;
        }

        let jwt = Arc::new(JwtHandler::new(token_config));
        let authenticator = Authenticator::new(Arc::new(user_store), jwt, config.bcrypt_cost)
            .context("Failed to initialise authenticator")?;

        info!(
            "🔐 Authentication initialized at: {} (token validity {}s)",
            config.auth_db_path, config.jwt_expires_at
        );

        Ok(Self {
            auth: AuthState::new(Arc::new(authenticator)),
            login_limit: RateLimit::new(config.login_rate_limit()),
        })
    }
}

/// Chain for the login route: logging, then per-IP rate limiting
pub fn login_chain(state: &AppState) -> MiddlewareChain {
    let layers: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(RequestLogging),
        Arc::new(state.login_limit.clone()),
    ];
    MiddlewareChain::new(layers)
}

/// Chain for protected routes: logging, then token validation
pub fn protected_chain(state: &AppState) -> MiddlewareChain {
    let jwt = state.auth.authenticator.jwt().clone();
    let layers: Vec<Arc<dyn Middleware>> =
        vec![Arc::new(RequestLogging), Arc::new(Authenticate::new(jwt))];
    MiddlewareChain::new(layers)
}

pub fn build_router(state: AppState) -> Router {
    let login = login_chain(&state).service(endpoint(auth_api::login, state.auth.clone()));
    let me = protected_chain(&state).service(endpoint(auth_api::me, ()));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/auth/login", post_service(login))
        .route("/api/v1/auth/me", get_service(me))
        .layer(CorsLayer::permissive())
}

async fn health_check() -> &'static str {
    "OK"
}
