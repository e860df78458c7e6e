//! Authentication utilities for administrator endpoints
//!
//! Provides:
//! - Argon2 password hashing and verification
//! - JWT token generation and validation
//! - The `AdminContext` extractor guarding admin routes

use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated administrator available to handlers
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub admin_id: Uuid,
    pub email: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (admin ID)
    pub sub: String,

    pub email: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: u64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs,
        }
    }

    /// Generate a signed token for an administrator
    pub fn generate_token(&self, admin_id: Uuid, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = i64::try_from(self.expiration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AppError::Configuration {
                message: format!("JWT expiration of {}s is out of range", self.expiration_secs),
            })?;

        let claims = JwtClaims {
            sub: admin_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal {
                message: format!("Failed to generate token: {}", e)
            })
    }

    /// Validate and decode a token. Every failure reads the same to callers.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected admin token");
                AppError::Unauthorized {
                    message: "Token invalid or expired".to_string(),
                }
            })
    }
}

/// Random hex secret for deployments that did not configure one
pub fn generate_secret() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

/// Hash a password into an Argon2 PHC string with a fresh salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Extract the token from an `Authorization: Bearer ...` header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Axum extractor for AdminContext
impl<S> FromRequestParts<S> for AdminContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer)
            .ok_or_else(|| AppError::Unauthorized {
                message: "Not authorized".to_string(),
            })?;

        let jwt = Arc::<JwtManager>::from_ref(state);
        let claims = jwt.validate_token(token)?;

        let admin_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized {
            message: "Token invalid or expired".to_string(),
        })?;

        Ok(AdminContext {
            admin_id,
            email: claims.email,
        })
    }
}
