//! Route definitions for administrative notification triggers.
//!
//! Owner/admin role required (enforced in the handlers).

use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin/notifications`.
///
/// ```text
/// POST /run-daily   -> run_daily
/// POST /run-weekly  -> run_weekly
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/run-daily", post(admin::run_daily))
        .route("/run-weekly", post(admin::run_weekly))
}
