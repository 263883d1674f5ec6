//! Anonymous session tokens.
//!
//! A session is an HS256-signed JWT whose subject is a freshly generated
//! user id. There is no user table: the token itself is the only record of
//! the anonymous user, and every batch stores the id it was created under.

use batchtone_core::error::CoreError;
use batchtone_core::types::UserId;
use batchtone_engine::identity::{Identity, IdentityProvider, Session};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the anonymous user's id.
    pub sub: UserId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier.
    pub jti: String,
}

/// Default session lifetime in days.
const DEFAULT_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    pub expiry_days: i64,
}

impl SessionConfig {
    /// Load session configuration from environment variables.
    ///
    /// | Env Var               | Required | Default |
    /// |-----------------------|----------|---------|
    /// | `SESSION_SECRET`      | **yes**  | --      |
    /// | `SESSION_EXPIRY_DAYS` | no       | `30`    |
    ///
    /// # Panics
    ///
    /// Panics if `SESSION_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret = std::env::var("SESSION_SECRET")
            .expect("SESSION_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "SESSION_SECRET must not be empty");

        let expiry_days: i64 = std::env::var("SESSION_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_EXPIRY_DAYS.to_string())
            .parse()
            .expect("SESSION_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            expiry_days,
        }
    }
}

/// [`IdentityProvider`] backed by signed session tokens.
pub struct SessionIssuer {
    config: SessionConfig,
}

impl SessionIssuer {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(), // HS256
            claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
    }

    /// Validate signature and expiry, returning the embedded [`Claims`].
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &Validation::default(), // HS256, validates exp
        )?;
        Ok(data.claims)
    }
}

impl IdentityProvider for SessionIssuer {
    fn current_user(&self, token: &str) -> Result<Identity, CoreError> {
        let claims = self
            .validate(token)
            .map_err(|_| CoreError::Unauthorized("Invalid or expired session".into()))?;
        Ok(Identity {
            user_id: claims.sub,
        })
    }

    fn create_anonymous_session(&self) -> Result<Session, CoreError> {
        let now = Utc::now().timestamp();
        let exp = now + self.config.expiry_days * 24 * 60 * 60;
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };

        let token = self
            .sign(&claims)
            .map_err(|e| CoreError::Internal(format!("Failed to sign session token: {e}")))?;
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| CoreError::Internal(format!("Session expiry {exp} out of range")))?;

        Ok(Session {
            token,
            user_id: claims.sub,
            expires_at,
        })
    }
}
