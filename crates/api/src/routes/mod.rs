//! Route tree assembly.

pub mod admin;
pub mod claim_events;
pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/notifications", notification::router())
        .nest("/admin/notifications", admin::router())
        .nest("/internal", claim_events::router())
}
