//! Route definitions for internal service ingress.

use axum::routing::post;
use axum::Router;

use crate::handlers::claim_events;
use crate::state::AppState;

/// Routes mounted at `/internal`.
///
/// ```text
/// POST /claim-events -> ingest (shared-secret header)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/claim-events", post(claim_events::ingest))
}
