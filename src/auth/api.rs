//! Authentication API Endpoints
//! Mission: Provide login and current-identity endpoints

use crate::auth::{
    login::{Authenticator, LoginError},
    middleware::CurrentUser,
    models::{IdentityResponse, LoginRequest, LoginResponse},
};
use crate::response::{ApiError, DataEnvelope, ErrorCode, LocaleQuery};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<Authenticator>,
}

impl AuthState {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }
}

/// Login endpoint - POST /api/v1/auth/login
pub async fn login(
    State(state): State<AuthState>,
    query: Option<Query<LocaleQuery>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DataEnvelope<LoginResponse>>), ApiError> {
    let locale = query.map(|Query(q)| q.locale()).unwrap_or_default();

    let Json(payload) = payload.map_err(|rejection| {
        warn!("Rejected login body: {}", rejection.body_text());
        ApiError::new(ErrorCode::InvalidRequestBody, locale)
    })?;

    let authenticator = state.authenticator.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        authenticator.login(&payload.username, &payload.password, Utc::now())
    })
    .await;

    match outcome {
        Ok(Ok(token)) => {
            info!("✅ Login successful");
            Ok((
                StatusCode::CREATED,
                Json(DataEnvelope::new(LoginResponse {
                    access_token: token,
                })),
            ))
        }
        Ok(Err(LoginError::InvalidCredentials)) => {
            warn!("❌ Failed login attempt");
            Err(ApiError::new(ErrorCode::InvalidCredentials, locale))
        }
        Ok(Err(e)) => {
            error!("Login failed: {}", e);
            Err(ApiError::new(ErrorCode::InternalError, locale))
        }
        Err(e) => {
            error!("Login task panicked: {}", e);
            Err(ApiError::new(ErrorCode::InternalError, locale))
        }
    }
}

/// Get current user info - GET /api/v1/auth/me
/// Built from the token claims (no database lookup needed)
pub async fn me(CurrentUser(claims): CurrentUser) -> Json<DataEnvelope<IdentityResponse>> {
    Json(DataEnvelope::new(IdentityResponse::from(&claims)))
}
