//! JWT validation for API requests.

use claimdesk_core::types::DbId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default secret for local development only.
const DEV_SECRET: &str = "claimdesk-dev-secret";

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret.
    pub secret: String,
}

impl JwtConfig {
    /// Load from the `JWT_SECRET` env var, falling back to a development
    /// secret.
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_SECRET.into()),
        }
    }
}

/// Claims carried by a Claimdesk access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// Tenant the user belongs to.
    pub tenant_id: DbId,
    /// Membership role (`owner`, `admin`, `agent`).
    pub role: String,
    /// Expiry, seconds since epoch.
    pub exp: usize,
}

/// Validate a bearer token and return its claims.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Sign a token for the given claims. Used by tests and operator tooling;
/// production tokens come from the auth service.
pub fn encode_token(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
