//! Login flow: user lookup, password verification, token issuance.
//!
//! Unknown usernames and wrong passwords produce the same error. An unknown
//! username still pays for one bcrypt verification against a placeholder hash.

use crate::auth::jwt::JwtHandler;
use crate::auth::password::{hash_password, verify_password, CredentialError};
use crate::auth::user_store::{UserCriteria, UserRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("credential verification failed: {0}")]
    Verifier(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("user lookup failed: {0:#}")]
    Lookup(anyhow::Error),
}

pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    jwt: Arc<JwtHandler>,
    placeholder_hash: String,
}

impl Authenticator {
    /// `bcrypt_cost` should match the cost of stored hashes so both failure
    /// paths take comparable time.
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt: Arc<JwtHandler>,
        bcrypt_cost: u32,
    ) -> Result<Self, CredentialError> {
        let placeholder_hash = hash_password("gatekeeper-placeholder", bcrypt_cost)?;
        Ok(Self {
            users,
            jwt,
            placeholder_hash,
        })
    }

    pub fn jwt(&self) -> &Arc<JwtHandler> {
        &self.jwt
    }

    /// Blocking: performs the lookup and one bcrypt verification.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<String, LoginError> {
        let user = self
            .users
            .find_one(&UserCriteria::username(username))
            .map_err(LoginError::Lookup)?;

        let Some(user) = user else {
            let _ = verify_password(&self.placeholder_hash, password);
            debug!("Login for unknown user");
            return Err(LoginError::InvalidCredentials);
        };

        match verify_password(&user.password_hash, password) {
            Ok(()) => {}
            Err(CredentialError::Mismatch) => {
                debug!(user_id = %user.id, "Password mismatch");
                return Err(LoginError::InvalidCredentials);
            }
            Err(CredentialError::VerifierFault(detail)) => {
                return Err(LoginError::Verifier(detail))
            }
        }

        debug!(user_id = %user.id, "Password verified");
        self.jwt
            .issue(&user, now)
            .map_err(|e| LoginError::Signing(e.to_string()))
    }
}
