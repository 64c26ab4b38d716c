//! JWT Token Handler
//! Mission: Issue and validate HS256 identity tokens against an injected clock
//!
//! Tokens are standard JWS compact strings (`header.claims.signature`, unpadded
//! base64url segments) so any JWT library holding the secret can verify them.
//! Nothing is stored server side: a token is honored until `exp`, and there
//! is no early revocation. Keep the validity short.

use crate::auth::models::{IdentityClaims, User};
use crate::config::ConfigError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Secrets shorter than this (256 bits) are accepted with a warning
pub const RECOMMENDED_SECRET_BYTES: usize = 32;

/// Token failures. The validation kinds are for logs only; callers collapse them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token signing failed: {0}")]
    SigningFault(String),
}

/// HMAC signing key. Never printed.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if bytes.len() < RECOMMENDED_SECRET_BYTES {
            warn!(
                len = bytes.len(),
                recommended = RECOMMENDED_SECRET_BYTES,
                "JWT secret is shorter than recommended"
            );
        }
        Ok(Self(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<{} bytes redacted>)", self.0.len())
    }
}

/// Process-wide token settings, injected into [`JwtHandler`]
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: SigningSecret,
    pub validity: Duration,
}

impl TokenConfig {
    pub fn new(secret: SigningSecret, validity: Duration) -> Result<Self, ConfigError> {
        if validity.as_secs() == 0 {
            return Err(ConfigError::InvalidValidity(validity.as_secs()));
        }
        Ok(Self { secret, validity })
    }
}

/// Mint a token for `user`, valid over `[now, now + validity)`.
pub fn issue_token(
    user: &User,
    now: DateTime<Utc>,
    secret: &[u8],
    validity: Duration,
) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::SigningFault("empty signing secret".to_string()));
    }

    let validity_secs = i64::try_from(validity.as_secs())
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| {
            TokenError::SigningFault(format!("invalid validity: {:?}", validity))
        })?;

    let iat = now.timestamp();
    let exp = iat
        .checked_add(validity_secs)
        .ok_or_else(|| TokenError::SigningFault("expiry overflows".to_string()))?;

    let claims = IdentityClaims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        iat,
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenError::SigningFault(e.to_string()))
}

/// Check `token` against `secret` at instant `now`.
///
/// Order matters: structure, then signature, then expiry. Claims are only
/// trusted after the signature checks out.
pub fn validate_token(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<IdentityClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked below against the caller's clock, with no leeway
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<IdentityClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::SignatureInvalid
            }
            _ => TokenError::Malformed(e.to_string()),
        })?;

    let claims = data.claims;
    if claims.exp <= claims.iat {
        return Err(TokenError::Malformed("exp is not after iat".to_string()));
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// JWT handler bound to one [`TokenConfig`]
#[derive(Debug, Clone)]
pub struct JwtHandler {
    config: TokenConfig,
}

impl JwtHandler {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Generate a JWT token for a user
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        debug!(
            user_id = %user.id,
            username = %user.username,
            validity_secs = self.config.validity.as_secs(),
            "Issuing JWT"
        );
        issue_token(user, now, self.config.secret.as_bytes(), self.config.validity)
    }

    /// Validate a JWT token and extract claims
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaims, TokenError> {
        let claims = validate_token(token, self.config.secret.as_bytes(), now)?;
        debug!(username = %claims.username, "Validated JWT");
        Ok(claims)
    }
}
