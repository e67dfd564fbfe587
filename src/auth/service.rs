//! Register, login, refresh and logout orchestration.
//!
//! Each user has at most one refresh token on record. Login and refresh replace it with a
//! conditional write against the value read at the start of the call, so a refresh token is
//! accepted exactly once and a concurrent writer is reported instead of silently overwritten.

use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::password::CredentialVerifier;
use super::token::{TokenCodec, TokenPair};
use crate::error::AppError;
use crate::models::{normalize_email, PublicUser, User};
use crate::store::UserStore;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
pub const EMAIL_TAKEN: &str = "Email already registered";
pub const SESSION_CONFLICT: &str = "Session was modified concurrently, please log in again";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialVerifier>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        codec: Arc<TokenCodec>,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            users,
            codec,
            credentials,
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Creates an account. The new user has no session until the first login.
    pub async fn register(&self, email: &str, password: &str) -> Result<PublicUser, AppError> {
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }

        let password_hash = self.credentials.hash_password(password)?;
        let user = self.users.create_user(User::new(email, password_hash)).await?;

        log::info!("registered user {}", user.id);
        Ok(PublicUser::from(&user))
    }

    /// Verifies credentials and starts a new session, revoking any previous refresh token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let email = normalize_email(email);
        let invalid = || AppError::Unauthorized(INVALID_CREDENTIALS.into());

        let user = self.users.find_by_email(&email).await?.ok_or_else(invalid)?;
        if !self.credentials.verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        let tokens = self.codec.issue_pair(&user.token_payload())?;
        self.store_session(&user, user.refresh_token.as_deref(), &tokens).await?;

        log::info!("user {} logged in", user.id);
        Ok(LoginOutcome {
            user: PublicUser::from(&user),
            tokens,
        })
    }

    /// Exchanges the user's current refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let invalid = || AppError::Unauthorized(INVALID_REFRESH_TOKEN.into());

        let payload = self.codec.verify_refresh(refresh_token).map_err(|e| {
            log::debug!("refresh token rejected: {}", e);
            invalid()
        })?;

        let user = self
            .users
            .find_by_id(payload.user_id)
            .await?
            .ok_or_else(invalid)?;

        let is_current = match user.refresh_token.as_deref() {
            Some(current) => bool::from(current.as_bytes().ct_eq(refresh_token.as_bytes())),
            None => false,
        };
        if !is_current {
            log::warn!(
                "user {} presented a refresh token that is not the current session",
                user.id
            );
            return Err(invalid());
        }

        let tokens = self.codec.issue_pair(&user.token_payload())?;
        self.store_session(&user, Some(refresh_token), &tokens).await?;

        log::info!("rotated refresh token for user {}", user.id);
        Ok(tokens)
    }

    /// Revokes the user's refresh token. Outstanding access tokens stay valid until they expire.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        if !self.users.clear_refresh_token(user_id).await? {
            return Err(AppError::Unauthorized("Not authenticated".into()));
        }

        log::info!("user {} logged out", user_id);
        Ok(())
    }

    async fn store_session(
        &self,
        user: &User,
        expected: Option<&str>,
        tokens: &TokenPair,
    ) -> Result<(), AppError> {
        let swapped = self
            .users
            .swap_refresh_token(user.id, expected, &tokens.refresh_token)
            .await?;

        if !swapped {
            log::warn!("lost a concurrent session update for user {}", user.id);
            return Err(AppError::Conflict(SESSION_CONFLICT.into()));
        }
        Ok(())
    }
}
