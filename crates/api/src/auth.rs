//! Bearer-token verification.
//!
//! Tokens are HS256 JWTs carrying the user id and role. Issuance lives
//! elsewhere; this module only verifies.

use axum::http::HeaderMap;
use domain::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// The caller's role, as asserted by the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

/// The JWT claim set.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user's id.
    pub id: Uuid,
    pub role: Role,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// A verified caller identity.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthUser {
    /// Returns an error unless the caller holds the admin role.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }
}

/// Verification configuration shared across handlers.
#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: DecodingKey,
}

impl AuthConfig {
    /// Creates a verifier over the given HS256 secret.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Verifies the `Authorization: Bearer <jwt>` header.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
        let header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".to_string()))?;

        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
                .map_err(|e| ApiError::Unauthorized(format!("invalid token: {e}")))?;

        Ok(AuthUser {
            user_id: UserId::from_uuid(data.claims.id),
            role: data.claims.role,
        })
    }
}
