//! The notification engine: unit enumeration and dispatch.
//!
//! [`NotificationEngine`] is the shared core behind both the clock-driven
//! [`Scheduler`](crate::scheduler::Scheduler) and the administrative
//! [`ManualTrigger`](crate::trigger::ManualTrigger). A tick enumerates the
//! due units for one cadence kind, dispatches them with bounded
//! concurrency, and folds the per-unit outcomes into a [`TickSummary`].
//!
//! Correctness properties enforced here:
//!
//! - A unit failure is caught at the unit boundary and never aborts the
//!   batch; the engine never raises out of a tick.
//! - Idempotency markers are written only after successful delivery, so a
//!   failed unit stays eligible on the next cadence (at-least-once).
//! - A marker rejected by its unique constraint means a concurrent writer
//!   already handled the unit; that is success, not an error.
//! - Ticks of the same kind are serialized by a per-kind guard; different
//!   kinds overlap freely.

use std::sync::Arc;

use claimdesk_core::cadence::{self, DigestKind, SendSpec};
use claimdesk_core::channels::{CHANNEL_EMAIL, CHANNEL_IN_APP};
use claimdesk_core::roles;
use claimdesk_core::summary::{self, SlaBreach};
use claimdesk_core::types::{DbId, Timestamp};
use claimdesk_db::models::notification::{KIND_INFO, KIND_WARNING};
use claimdesk_db::repositories::{
    ClaimRepo, DigestSendRepo, MarkerInsert, NotificationRepo, PreferenceRepo,
    SlaNotificationRepo, TenantRepo, UserRepo,
};
use claimdesk_db::DbPool;
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::email::{EmailError, Mailer};
use crate::outcome::{OutcomeStatus, TickSummary, UnitOutcome};
use crate::unit::{DigestUnit, NotificationUnit, SlaRecipient, SlaUnit, TickKind};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default number of units dispatched concurrently within one tick.
const DEFAULT_DISPATCH_CONCURRENCY: usize = 8;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum units in flight at once within a single tick.
    pub dispatch_concurrency: usize,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable               | Default |
    /// |------------------------|---------|
    /// | `DISPATCH_CONCURRENCY` | `8`     |
    pub fn from_env() -> Self {
        let dispatch_concurrency = std::env::var("DISPATCH_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DISPATCH_CONCURRENCY);
        Self {
            dispatch_concurrency,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatch_concurrency: DEFAULT_DISPATCH_CONCURRENCY,
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerScope
// ---------------------------------------------------------------------------

/// Narrows a digest run for administrative triggers.
///
/// Any explicit scope bypasses the due-ness gate (the admin decided the
/// digest should go out now); the idempotency marker still applies unless
/// the caller sets `force`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerScope {
    pub tenant_id: Option<DbId>,
    pub user_id: Option<DbId>,
}

impl TriggerScope {
    /// The unscoped run used by the scheduler.
    pub fn all() -> Self {
        Self::default()
    }

    fn is_scoped(&self) -> bool {
        self.tenant_id.is_some() || self.user_id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Failure inside one unit's dispatch. Converted to a failed outcome at the
/// unit boundary, never propagated past it.
#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("email delivery failed: {0}")]
    Email(#[from] EmailError),

    #[error("email channel enabled but SMTP is not configured")]
    EmailNotConfigured,
}

// ---------------------------------------------------------------------------
// NotificationEngine
// ---------------------------------------------------------------------------

/// Shared dispatch core for scheduled ticks and manual triggers.
pub struct NotificationEngine {
    pool: DbPool,
    mailer: Option<Arc<dyn Mailer>>,
    config: EngineConfig,
    daily_guard: Mutex<()>,
    weekly_guard: Mutex<()>,
    sla_guard: Mutex<()>,
}

impl NotificationEngine {
    /// Create an engine. `mailer` is `None` when SMTP is not configured;
    /// units whose only enabled channel is email will then fail (and stay
    /// eligible) rather than being silently marked sent.
    pub fn new(pool: DbPool, mailer: Option<Arc<dyn Mailer>>, config: EngineConfig) -> Self {
        Self {
            pool,
            mailer,
            config,
            daily_guard: Mutex::new(()),
            weekly_guard: Mutex::new(()),
            sla_guard: Mutex::new(()),
        }
    }

    fn guard(&self, kind: TickKind) -> &Mutex<()> {
        match kind {
            TickKind::Daily => &self.daily_guard,
            TickKind::Weekly => &self.weekly_guard,
            TickKind::Sla => &self.sla_guard,
        }
    }

    /// One evaluation pass for a cadence kind at `reference`.
    ///
    /// Never raises; always returns a summary. Idempotent under retry: a
    /// re-invocation for the same reference time skips users already marked
    /// sent and re-attempts users that previously failed.
    pub async fn tick(&self, kind: TickKind, reference: Timestamp) -> TickSummary {
        match kind {
            TickKind::Daily => {
                self.run_digest(DigestKind::Daily, reference, TriggerScope::all(), false)
                    .await
            }
            TickKind::Weekly => {
                self.run_digest(DigestKind::Weekly, reference, TriggerScope::all(), false)
                    .await
            }
            TickKind::Sla => self.run_sla(reference).await,
        }
    }

    /// Run a digest pass, scheduled or scoped.
    ///
    /// Shared by [`tick`](Self::tick) and the manual-trigger gateway so the
    /// two paths cannot diverge in behaviour.
    pub async fn run_digest(
        &self,
        kind: DigestKind,
        reference: Timestamp,
        scope: TriggerScope,
        force: bool,
    ) -> TickSummary {
        let _guard = self.guard(kind.into()).lock().await;

        let (units, prefailed) = match self.enumerate_digest(kind, reference, scope).await {
            Ok(enumerated) => enumerated,
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Digest enumeration failed");
                return TickSummary::enumeration_failure(format!(
                    "{kind} digest enumeration: {e}"
                ));
            }
        };

        let mut outcomes = self.dispatch_all(units, force).await;
        outcomes.extend(prefailed);

        let summary = TickSummary::from_outcomes(outcomes);
        tracing::info!(
            kind = %kind,
            processed = summary.processed,
            sent = summary.sent,
            failed = summary.failed,
            "Digest tick complete"
        );
        summary
    }

    /// Run an SLA alert pass at `reference`.
    pub async fn run_sla(&self, reference: Timestamp) -> TickSummary {
        let _guard = self.guard(TickKind::Sla).lock().await;

        let units = match self.enumerate_sla(reference).await {
            Ok(units) => units,
            Err(e) => {
                tracing::error!(error = %e, "SLA enumeration failed");
                return TickSummary::enumeration_failure(format!("sla enumeration: {e}"));
            }
        };

        let summary = TickSummary::from_outcomes(self.dispatch_all(units, false).await);
        tracing::info!(
            processed = summary.processed,
            sent = summary.sent,
            failed = summary.failed,
            "SLA tick complete"
        );
        summary
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    /// Enumerate digest units for a run.
    ///
    /// Returns the dispatchable units plus pre-failed outcomes for
    /// candidates whose stored schedule cannot be decoded (a permanent
    /// content failure: it is reported, not retried into oblivion).
    async fn enumerate_digest(
        &self,
        kind: DigestKind,
        reference: Timestamp,
        scope: TriggerScope,
    ) -> Result<(Vec<NotificationUnit>, Vec<UnitOutcome>), sqlx::Error> {
        let candidates = if let Some(user_id) = scope.user_id {
            PreferenceRepo::candidate_for_user(&self.pool, user_id)
                .await?
                .into_iter()
                .collect()
        } else {
            PreferenceRepo::list_digest_candidates(&self.pool, kind, scope.tenant_id, None).await?
        };

        let bypass_dueness = scope.is_scoped();
        let mut units = Vec::new();
        let mut prefailed = Vec::new();

        for candidate in candidates {
            let spec = match SendSpec::from_parts(
                candidate.send_hour,
                candidate.send_minute,
                candidate.weekly_anchor,
                &candidate.timezone,
            ) {
                Ok(spec) => spec,
                Err(e) => {
                    tracing::warn!(
                        user_id = candidate.user_id,
                        error = %e,
                        "Invalid send schedule on preference row"
                    );
                    prefailed.push(UnitOutcome::failed(format!(
                        "{kind} digest user={}: invalid schedule: {e}",
                        candidate.user_id
                    )));
                    continue;
                }
            };

            let period = if bypass_dueness {
                cadence::current_period(kind, &spec, reference)
            } else {
                cadence::due_period(kind, &spec, reference)
            };
            let Some(period) = period else { continue };

            units.push(NotificationUnit::Digest(DigestUnit {
                kind,
                candidate,
                period_key: period.period_key,
                window: period.window,
            }));
        }

        Ok((units, prefailed))
    }

    /// Enumerate one SLA unit per breaching claim without a prior alert for
    /// its breach instant. Recipient resolution: the assignee when the
    /// claim is assigned to an active user, otherwise the tenant's owners
    /// and admins.
    async fn enumerate_sla(
        &self,
        reference: Timestamp,
    ) -> Result<Vec<NotificationUnit>, sqlx::Error> {
        let overdue = ClaimRepo::list_overdue_unresolved(&self.pool, reference).await?;

        let mut units = Vec::new();
        for claim in overdue {
            let assignee = match claim.assigned_user_id {
                Some(user_id) => UserRepo::find_by_id(&self.pool, user_id)
                    .await?
                    .filter(|u| u.is_active),
                None => None,
            };

            let recipients = match assignee {
                Some(user) => vec![SlaRecipient {
                    user_id: user.id,
                    email: user.email,
                }],
                None => UserRepo::list_tenant_managers(&self.pool, claim.tenant_id)
                    .await?
                    .into_iter()
                    .map(|u| SlaRecipient {
                        user_id: u.id,
                        email: u.email,
                    })
                    .collect(),
            };

            units.push(NotificationUnit::Sla(SlaUnit {
                claim,
                recipients,
                reference,
            }));
        }

        Ok(units)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Dispatch a batch with bounded concurrency. Every unit resolves to an
    /// outcome; none is dropped.
    async fn dispatch_all(&self, units: Vec<NotificationUnit>, force: bool) -> Vec<UnitOutcome> {
        futures::stream::iter(units)
            .map(|unit| self.dispatch(unit, force))
            .buffer_unordered(self.config.dispatch_concurrency.max(1))
            .collect()
            .await
    }

    /// Dispatch one unit.
    ///
    /// This is the unit failure boundary: any internal error surfaces as a
    /// failed outcome and the batch's other units are unaffected.
    pub async fn dispatch(&self, unit: NotificationUnit, force: bool) -> UnitOutcome {
        let label = unit.describe();
        let result = match &unit {
            NotificationUnit::Digest(u) => self.dispatch_digest(u, force).await,
            NotificationUnit::Sla(u) => self.dispatch_sla(u).await,
        };

        match result {
            Ok(status) => UnitOutcome {
                status,
                error: None,
            },
            Err(e) => {
                tracing::error!(unit = %label, error = %e, "Dispatch failed");
                UnitOutcome::failed(format!("{label}: {e}"))
            }
        }
    }

    async fn dispatch_digest(
        &self,
        unit: &DigestUnit,
        force: bool,
    ) -> Result<OutcomeStatus, DispatchError> {
        let candidate = &unit.candidate;

        // The tenant may have been deactivated between enumeration and
        // dispatch; such units are excluded, not failed.
        let tenant = TenantRepo::find_by_id(&self.pool, candidate.tenant_id)
            .await?
            .filter(|t| t.is_active);
        let Some(tenant) = tenant else {
            tracing::debug!(
                tenant_id = candidate.tenant_id,
                user_id = candidate.user_id,
                "Tenant deactivated mid-tick, excluding unit"
            );
            return Ok(OutcomeStatus::Excluded);
        };

        if !force
            && DigestSendRepo::exists(&self.pool, candidate.user_id, unit.kind, &unit.period_key)
                .await?
        {
            return Ok(OutcomeStatus::Skipped);
        }

        let channels = candidate.channel_names();
        if channels.is_empty() {
            return Ok(OutcomeStatus::Skipped);
        }

        // Tenant-scoped visibility: agents only see their own claims.
        let visible_to = if roles::is_manager(&candidate.role) {
            None
        } else {
            Some(candidate.user_id)
        };
        let counts =
            ClaimRepo::aggregate_counts(&self.pool, candidate.tenant_id, visible_to, unit.window)
                .await?;

        if counts.is_empty() && !tenant.send_empty_digest {
            // Nothing to report and the tenant suppresses all-clear digests.
            // The marker stays untouched per policy.
            return Ok(OutcomeStatus::Skipped);
        }

        let (subject, body) = summary::render_digest(unit.kind, &tenant.name, &counts);

        for channel in &channels {
            match channel.as_str() {
                CHANNEL_EMAIL => {
                    let mailer = self
                        .mailer
                        .as_ref()
                        .ok_or(DispatchError::EmailNotConfigured)?;
                    mailer.send(&candidate.email, &subject, &body).await?;
                }
                CHANNEL_IN_APP => {
                    NotificationRepo::create(
                        &self.pool,
                        candidate.tenant_id,
                        candidate.user_id,
                        &subject,
                        &body,
                        KIND_INFO,
                    )
                    .await?;
                }
                other => {
                    tracing::warn!(channel = other, "Unknown delivery channel, ignoring");
                }
            }
        }

        // Markers advance only after successful delivery. A rejected marker
        // means a concurrent writer handled the unit: success either way.
        let marker =
            DigestSendRepo::record(&self.pool, candidate.user_id, unit.kind, &unit.period_key)
                .await?;
        if marker == MarkerInsert::AlreadyRecorded {
            tracing::debug!(
                user_id = candidate.user_id,
                period = %unit.period_key,
                "Digest marker already recorded by a concurrent writer"
            );
        }
        PreferenceRepo::mark_digest_sent(&self.pool, candidate.user_id, unit.kind).await?;

        tracing::info!(
            user_id = candidate.user_id,
            kind = %unit.kind,
            period = %unit.period_key,
            "Digest delivered"
        );
        Ok(OutcomeStatus::Sent)
    }

    async fn dispatch_sla(&self, unit: &SlaUnit) -> Result<OutcomeStatus, DispatchError> {
        let claim = &unit.claim;

        let tenant = TenantRepo::find_by_id(&self.pool, claim.tenant_id)
            .await?
            .filter(|t| t.is_active);
        if tenant.is_none() {
            return Ok(OutcomeStatus::Excluded);
        }

        if SlaNotificationRepo::exists(&self.pool, claim.id, claim.sla_due_at).await? {
            return Ok(OutcomeStatus::Skipped);
        }

        if unit.recipients.is_empty() {
            // No assignee and no managers; leave the marker unset so the
            // breach is alerted once the tenant has someone to tell.
            tracing::warn!(claim_id = claim.id, "SLA breach has no recipients");
            return Ok(OutcomeStatus::Skipped);
        }

        let breach = SlaBreach {
            claim_reference: claim.reference.clone(),
            claim_title: claim.title.clone(),
            customer_name: claim.customer_name.clone(),
            overdue: unit.reference - claim.sla_due_at,
        };
        let (subject, body) = summary::render_sla_alert(&claim.tenant_name, &breach);

        // SLA alerts are mandatory: always an in-app row, plus email when
        // SMTP is configured.
        for recipient in &unit.recipients {
            NotificationRepo::create(
                &self.pool,
                claim.tenant_id,
                recipient.user_id,
                &subject,
                &body,
                KIND_WARNING,
            )
            .await?;
            if let Some(mailer) = &self.mailer {
                mailer.send(&recipient.email, &subject, &body).await?;
            }
        }

        let marker = SlaNotificationRepo::record(&self.pool, claim.id, claim.sla_due_at).await?;
        if marker == MarkerInsert::AlreadyRecorded {
            tracing::debug!(
                claim_id = claim.id,
                "SLA marker already recorded by a concurrent writer"
            );
        }

        tracing::info!(
            claim_id = claim.id,
            breach_at = %claim.sla_due_at,
            recipients = unit.recipients.len(),
            "SLA breach alerted"
        );
        Ok(OutcomeStatus::Sent)
    }
}
