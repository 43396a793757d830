//! Ingress for claim lifecycle events from the claims CRUD service.
//!
//! The claims backend reports create/assign/resolve events here after its
//! own transaction commits. The fan-out is best-effort by contract, so
//! this endpoint acknowledges with 202 once the event is accepted; a
//! notification write failure is logged inside the notifier and never
//! surfaces to the claims service.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use claimdesk_core::error::CoreError;
use claimdesk_core::types::DbId;
use claimdesk_db::repositories::ClaimRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the shared secret for internal ingress.
const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// A claim lifecycle event.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClaimEventRequest {
    Created {
        claim_id: DbId,
        /// Extra recipients beyond the tenant's owners/admins.
        #[serde(default)]
        preferred_user_ids: Vec<DbId>,
    },
    Assigned {
        claim_id: DbId,
        user_id: Option<DbId>,
    },
    Resolved {
        claim_id: DbId,
        user_id: Option<DbId>,
    },
}

impl ClaimEventRequest {
    fn claim_id(&self) -> DbId {
        match self {
            ClaimEventRequest::Created { claim_id, .. }
            | ClaimEventRequest::Assigned { claim_id, .. }
            | ClaimEventRequest::Resolved { claim_id, .. } => *claim_id,
        }
    }
}

/// POST /api/v1/internal/claim-events
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ClaimEventRequest>,
) -> AppResult<StatusCode> {
    verify_internal_token(&state, &headers)?;

    let claim_id = input.claim_id();
    let claim = ClaimRepo::find_by_id(&state.pool, claim_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Claim",
            id: claim_id,
        }))?;

    match input {
        ClaimEventRequest::Created {
            preferred_user_ids, ..
        } => {
            state
                .lifecycle
                .notify_new_claim(&claim, &preferred_user_ids)
                .await;
        }
        ClaimEventRequest::Assigned { user_id, .. } => {
            state.lifecycle.notify_claim_assigned(user_id, &claim).await;
        }
        ClaimEventRequest::Resolved { user_id, .. } => {
            state.lifecycle.notify_claim_resolved(user_id, &claim).await;
        }
    }

    Ok(StatusCode::ACCEPTED)
}

/// Check the shared-secret header. Ingress is rejected entirely when no
/// token is configured.
fn verify_internal_token(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = &state.config.internal_api_token else {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Internal ingress is not configured".to_string(),
        )));
    };

    let presented = headers
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if presented != Some(expected.as_str()) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid internal token".to_string(),
        )));
    }
    Ok(())
}
