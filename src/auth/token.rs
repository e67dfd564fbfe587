use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, expiration or structure check failed.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime does not fit the clock")]
    LifetimeOverflow,
}

/// Identity embedded in both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub user_id: Uuid,
    pub email: String,
}

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Random token id, keeps two tokens minted in the same second distinct.
    pub jti: Uuid,
}

impl From<Claims> for TokenPayload {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

/// An access/refresh pair. Always minted together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Signs and verifies the two token kinds, each with its own secret and lifetime.
///
/// Verification is purely cryptographic and time based; whether a refresh token is still the
/// user's current one is decided by `AuthService`.
pub struct TokenCodec {
    access: SigningKey,
    refresh: SigningKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            access: SigningKey::new(&config.access_secret, config.access_expiry),
            refresh: SigningKey::new(&config.refresh_secret, config.refresh_expiry),
            validation,
        }
    }

    pub fn issue_access(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        Self::issue(&self.access, payload)
    }

    pub fn issue_refresh(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        Self::issue(&self.refresh, payload)
    }

    pub fn issue_pair(&self, payload: &TokenPayload) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access(payload)?,
            refresh_token: self.issue_refresh(payload)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<TokenPayload, TokenError> {
        self.verify(&self.access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<TokenPayload, TokenError> {
        self.verify(&self.refresh, token)
    }

    fn issue(key: &SigningKey, payload: &TokenPayload) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(key.ttl)
            .ok_or(TokenError::LifetimeOverflow)?;
        let claims = Claims {
            user_id: payload.user_id,
            email: payload.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &key.encoding).map_err(TokenError::Signing)
    }

    /// `exp` is exclusive: a token is dead from its `exp` second onward.
    fn verify(&self, key: &SigningKey, token: &str) -> Result<TokenPayload, TokenError> {
        let claims = decode::<Claims>(token, &key.decoding, &self.validation)
            .map_err(TokenError::Invalid)?
            .claims;

        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Invalid(ErrorKind::ExpiredSignature.into()));
        }
        Ok(claims.into())
    }
}
