//! Authentication Module
//! Mission: Verify passwords, mint and check JWTs, guard routes

pub mod api;
pub mod jwt;
pub mod login;
pub mod middleware;
pub mod models;
pub mod password;
pub mod user_store;

pub use api::AuthState;
pub use jwt::{JwtHandler, TokenConfig, TokenError};
pub use login::Authenticator;
pub use middleware::{Authenticate, CurrentUser};
pub use password::{verify_password, CredentialError};
pub use user_store::{UserRepository, UserStore};
