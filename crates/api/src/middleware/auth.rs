//! Bearer-token authentication extractor.

use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use claimdesk_core::error::CoreError;
use claimdesk_core::roles;
use claimdesk_core::types::DbId;

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub tenant_id: DbId,
    pub role: String,
}

impl AuthUser {
    /// Reject callers without an owner or admin role.
    pub fn require_manager(&self) -> Result<(), AppError> {
        if roles::is_manager(&self.role) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(
                "This action requires an owner or admin role".to_string(),
            )))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing bearer token".to_string(),
                ))
            })?;

        let claims = jwt::decode_token(&app.config.jwt.secret, token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            role: claims.role,
        })
    }
}
