//! Domain service for authentication and token management.
//!
//! Handles login, access token verification, refresh token rotation and
//! logout. Access tokens are short-lived JWTs; refresh tokens are opaque
//! single-use values stored server-side.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid or already used refresh token")]
    InvalidRefreshToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified per JWT convention.
    pub sub: String,
    pub role_id: i32,
    pub iat: i64,
    pub exp: i64,
    pub token_type: String,
}

/// The authenticated caller, attached to requests after token verification.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: i32,
    pub role_id: i32,
}

/// Access/refresh pair handed out on login and on rotation.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: i32,
    pub workshop_id: Option<i32>,
    pub last_login: Option<String>,
}

/// Login result: who logged in, plus their tokens.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: UserInfo,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the email or password
    /// is wrong, [`AuthError::AccountDisabled`] for deactivated accounts.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Verifies an access token and returns the caller it identifies.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] for missing, malformed,
    /// expired or wrongly-typed tokens.
    async fn verify_access(&self, token: &str) -> Result<Principal, AuthError>;

    /// Rotates a refresh token: redeems it and issues a fresh pair.
    /// Each refresh token is single-use.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidRefreshToken`] when the token is unknown,
    /// expired, or was already redeemed; [`AuthError::AccountDisabled`] when
    /// the account was deactivated after the token was issued.
    async fn rotate_refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revokes every outstanding refresh token for the user.
    async fn logout(&self, user_id: i32) -> Result<(), AuthError>;

    /// Gets information for a specific user.
    async fn get_user_info(&self, user_id: i32) -> Result<UserInfo, AuthError>;

    /// Changes a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is
    /// incorrect or the new password is invalid.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
