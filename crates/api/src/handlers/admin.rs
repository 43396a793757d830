//! Administrative trigger endpoints.
//!
//! These re-run the digest machinery out of band for support and operator
//! workflows. They share the engine's dispatch path and idempotency
//! markers with the scheduler, so a resend cannot behave differently from
//! the automatic path. Owner/admin role required.

use axum::extract::State;
use axum::Json;
use claimdesk_core::types::DbId;
use claimdesk_notify::TickSummary;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /admin/notifications/run-daily`.
#[derive(Debug, Deserialize)]
pub struct RunDailyRequest {
    /// Limit the run to one tenant. Omit both ids for a full pass.
    pub tenant_id: Option<DbId>,
    /// Limit the run to one user (bypasses the due-ness gate).
    pub user_id: Option<DbId>,
    /// Resend even if a digest was already sent for the current period.
    #[serde(default)]
    pub force: bool,
}

/// Body for `POST /admin/notifications/run-weekly`.
#[derive(Debug, Deserialize)]
pub struct RunWeeklyRequest {
    pub tenant_id: Option<DbId>,
    #[serde(default)]
    pub force: bool,
}

/// POST /api/v1/admin/notifications/run-daily
///
/// Run a daily digest pass now and return its summary. `processed = 0`
/// means nothing was in scope; `failed > 0` means work was attempted and
/// failed (details in `errors`).
pub async fn run_daily(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RunDailyRequest>,
) -> AppResult<Json<DataResponse<TickSummary>>> {
    auth.require_manager()?;

    tracing::info!(
        actor = auth.user_id,
        tenant_id = input.tenant_id,
        user_id = input.user_id,
        force = input.force,
        "Manual daily digest trigger"
    );

    let summary = state
        .trigger
        .trigger_daily(input.tenant_id, input.user_id, input.force)
        .await;

    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/admin/notifications/run-weekly
///
/// Run a weekly digest pass now and return its summary.
pub async fn run_weekly(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RunWeeklyRequest>,
) -> AppResult<Json<DataResponse<TickSummary>>> {
    auth.require_manager()?;

    tracing::info!(
        actor = auth.user_id,
        tenant_id = input.tenant_id,
        force = input.force,
        "Manual weekly digest trigger"
    );

    let summary = state
        .trigger
        .trigger_weekly(input.tenant_id, input.force)
        .await;

    Ok(Json(DataResponse { data: summary }))
}
