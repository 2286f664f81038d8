//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::config::{JwtConfig, SecurityConfig};
use crate::db::{Store, User};
use crate::services::auth_service::{
    AuthError, AuthService, Claims, LoginResult, Principal, TokenPair, UserInfo,
};

const ACCESS_TOKEN_TYPE: &str = "access";

pub struct SeaOrmAuthService {
    store: Store,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, jwt: &JwtConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            encoding_key: EncodingKey::from_secret(jwt.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt.secret.as_bytes()),
            access_ttl: Duration::minutes(jwt.access_ttl_minutes),
            refresh_ttl: Duration::days(jwt.refresh_ttl_days),
            security,
        }
    }

    fn encode_access_token(&self, user_id: i32, role_id: i32) -> Result<(String, i64), AuthError> {
        let now = Utc::now();
        let exp = now + self.access_ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            role_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign access token: {e}")))?;

        Ok((token, self.access_ttl.num_seconds()))
    }

    /// Mint a token pair and persist the refresh side.
    async fn issue_tokens(&self, user_id: i32, role_id: i32) -> Result<TokenPair, AuthError> {
        let (access_token, expires_in) = self.encode_access_token(user_id, role_id)?;

        let refresh_token = Uuid::new_v4().to_string();
        let expires_at = (Utc::now() + self.refresh_ttl).to_rfc3339();
        self.store
            .store_refresh_token(user_id, &refresh_token, &expires_at)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in,
        })
    }

    fn user_info(user: User) -> UserInfo {
        UserInfo {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role_id: user.role_id,
            workshop_id: user.workshop_id,
            last_login: user.last_login,
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Disabled accounts are rejected before any password work
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let is_valid = self.store.verify_user_password(email, password).await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.store.touch_user_last_login(user.id).await?;

        let tokens = self.issue_tokens(user.id, user.role_id).await?;

        Ok(LoginResult {
            user: Self::user_info(user),
            tokens,
        })
    }

    async fn verify_access(&self, token: &str) -> Result<Principal, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::Unauthenticated)?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::Unauthenticated);
        }

        let user_id: i32 = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::Unauthenticated)?;

        // The account may have been disabled after the token was issued
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !user.is_active {
            return Err(AuthError::Unauthenticated);
        }

        Ok(Principal {
            user_id: user.id,
            role_id: user.role_id,
        })
    }

    async fn rotate_refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let row = self
            .store
            .consume_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // RFC 3339 strings compare in timestamp order
        if row.expires_at < Utc::now().to_rfc3339() {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .store
            .get_user_by_id(row.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.issue_tokens(user.id, user.role_id).await
    }

    async fn logout(&self, user_id: i32) -> Result<(), AuthError> {
        self.store.revoke_user_refresh_tokens(user_id).await?;
        Ok(())
    }

    async fn get_user_info(&self, user_id: i32) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(Self::user_info(user))
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let is_valid = self
            .store
            .verify_user_password(&user.email, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(user_id, new_password, Some(&self.security))
            .await?;

        // A password change invalidates every outstanding refresh token
        self.store.revoke_user_refresh_tokens(user_id).await?;

        Ok(())
    }
}
