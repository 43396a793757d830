use std::sync::Arc;

use claimdesk_notify::{LifecycleNotifier, ManualTrigger};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: claimdesk_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Administrative resend gateway around the notification engine.
    pub trigger: ManualTrigger,
    /// Best-effort claim-lifecycle fan-out.
    pub lifecycle: LifecycleNotifier,
}
