//! Administrative resend gateway.
//!
//! [`ManualTrigger`] re-invokes the engine's digest path for a narrowed
//! scope. It shares the dispatch machinery, per-kind guards, and
//! idempotency markers with the scheduled path, so an administrative
//! "resend" cannot diverge in behaviour from the automatic one.

use std::sync::Arc;

use chrono::Utc;
use claimdesk_core::cadence::DigestKind;
use claimdesk_core::types::DbId;

use crate::engine::{NotificationEngine, TriggerScope};
use crate::outcome::TickSummary;

/// Out-of-band entry point for administrative digest runs.
#[derive(Clone)]
pub struct ManualTrigger {
    engine: Arc<NotificationEngine>,
}

impl ManualTrigger {
    pub fn new(engine: Arc<NotificationEngine>) -> Self {
        Self { engine }
    }

    /// Run a daily digest pass now.
    ///
    /// With both ids, exactly one (tenant, user) unit is processed and the
    /// due-ness gate is bypassed; with only `tenant_id`, all users of that
    /// tenant; with neither, the call is identical to a scheduled tick.
    /// The sent marker is honoured unless `force` is set.
    pub async fn trigger_daily(
        &self,
        tenant_id: Option<DbId>,
        user_id: Option<DbId>,
        force: bool,
    ) -> TickSummary {
        self.engine
            .run_digest(
                DigestKind::Daily,
                Utc::now(),
                TriggerScope { tenant_id, user_id },
                force,
            )
            .await
    }

    /// Run a weekly digest pass now, optionally scoped to one tenant.
    pub async fn trigger_weekly(&self, tenant_id: Option<DbId>, force: bool) -> TickSummary {
        self.engine
            .run_digest(
                DigestKind::Weekly,
                Utc::now(),
                TriggerScope {
                    tenant_id,
                    user_id: None,
                },
                force,
            )
            .await
    }
}
