//! JWT authentication module.
//!
//! Handles password hashing, token issuance and validation.
//!
//! ## Login Flow
//! ```text
//! POST /api/auth/login {username, password}
//!      │
//!      ▼
//! active user? ──no──► verify against DUMMY_PASSWORD_HASH ──► 401
//!      │                 (same argon2 cost either way)
//!     yes
//!      ▼
//! argon2 verify ──fail──► 401 "Invalid credentials"
//!      │
//!      ▼
//! HS256 token {sub, userId, username, role, iat, exp, jti}
//! ```
//!
//! ## Secret Rotation
//! Tokens are signed with `auth.jwt_secret` and accepted if any of
//! `jwt_secret` or `previous_jwt_secrets` verifies them.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use kade_core::{User, UserRole};

use crate::config::AuthConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// A well-formed argon2id hash no password matches. Unknown usernames are
/// verified against it so they cost the same as wrong passwords.
pub const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

// =============================================================================
// Passwords
// =============================================================================

/// Hashes a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// Checks a password against a stored PHC string. An unparseable hash
/// never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "Stored password hash is not a valid PHC string");
            false
        }
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id as a string)
    pub sub: String,

    #[serde(rename = "userId")]
    pub user_id: i64,

    pub username: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding_key: EncodingKey,
    /// Current secret first, then previous ones.
    decoding_keys: Vec<DecodingKey>,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, previous_secrets: &[String], lifetime_secs: i64) -> Self {
        let decoding_keys = std::iter::once(secret)
            .chain(previous_secrets.iter().map(String::as_str))
            .map(|s| DecodingKey::from_secret(s.as_bytes()))
            .collect();

        JwtManager {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_keys,
            lifetime_secs,
        }
    }

    /// Builds the manager from configuration. Without a configured secret
    /// a random one is generated and tokens die with the process.
    pub fn from_config(config: &AuthConfig) -> Self {
        match config.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => {
                Self::new(secret, &config.previous_jwt_secrets, config.token_lifetime_secs)
            }
            _ => {
                warn!("auth.jwt_secret is not set; using an ephemeral secret, tokens will not survive a restart");
                let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
                Self::new(&secret, &config.previous_jwt_secrets, config.token_lifetime_secs)
            }
        }
    }

    /// Issues a token for `user`.
    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.to_string(),
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {e}")))
    }

    /// Validates a token against the current and previous secrets.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let mut expired = false;

        for key in &self.decoding_keys {
            match decode::<Claims>(token, key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => expired = true,
                Err(e) => debug!(error = %e, "Token rejected by key"),
            }
        }

        Err(ApiError::Unauthorized(
            if expired { "Token expired" } else { "Invalid token" }.to_string(),
        ))
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Extractor & Middleware
// =============================================================================

impl FromRequestParts<AppState> for Claims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(claims.clone());
        }

        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
        state.jwt.validate(token)
    }
}

/// Rejects requests without a valid bearer token. Installed on the `/api`
/// routes when `auth.require_auth` is on; the claims are stored in the
/// request extensions for handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
    let claims = state.jwt.validate(token)?;

    debug!(user_id = claims.user_id, path = %request.uri().path(), "Authenticated request");
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
