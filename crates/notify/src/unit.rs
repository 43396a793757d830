//! Units of work consumed by the dispatch engine.
//!
//! A unit is the ephemeral descriptor of one candidate send, produced
//! during enumeration and discarded after its outcome is recorded. Nothing
//! here is persisted.

use claimdesk_core::cadence::{DigestKind, Window};
use claimdesk_core::types::{DbId, Timestamp};
use claimdesk_db::models::claim::OverdueClaim;
use claimdesk_db::models::notification::DigestCandidate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TickKind
// ---------------------------------------------------------------------------

/// The three scheduler cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickKind {
    Daily,
    Weekly,
    Sla,
}

impl TickKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TickKind::Daily => "daily",
            TickKind::Weekly => "weekly",
            TickKind::Sla => "sla",
        }
    }
}

impl std::fmt::Display for TickKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DigestKind> for TickKind {
    fn from(kind: DigestKind) -> Self {
        match kind {
            DigestKind::Daily => TickKind::Daily,
            DigestKind::Weekly => TickKind::Weekly,
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationUnit
// ---------------------------------------------------------------------------

/// One candidate notification send.
///
/// Digest and SLA units are distinct variants rather than one record shape
/// because they carry different idempotency keys: (user, kind, period)
/// versus (claim, breach instant).
#[derive(Debug, Clone)]
pub enum NotificationUnit {
    Digest(DigestUnit),
    Sla(SlaUnit),
}

impl NotificationUnit {
    /// Short label used in log lines and batch error summaries.
    pub fn describe(&self) -> String {
        match self {
            NotificationUnit::Digest(u) => format!(
                "{} digest user={} period={}",
                u.kind, u.candidate.user_id, u.period_key
            ),
            NotificationUnit::Sla(u) => format!(
                "sla alert claim={} breach={}",
                u.claim.id,
                u.claim.sla_due_at.to_rfc3339()
            ),
        }
    }
}

/// A digest send for one user and one period.
#[derive(Debug, Clone)]
pub struct DigestUnit {
    pub kind: DigestKind,
    pub candidate: DigestCandidate,
    /// Idempotency key within (user, kind).
    pub period_key: String,
    /// The time range the digest summarizes.
    pub window: Window,
}

/// An SLA breach alert for one claim.
#[derive(Debug, Clone)]
pub struct SlaUnit {
    pub claim: OverdueClaim,
    /// Assignee when the claim is assigned, otherwise the tenant's owners
    /// and admins.
    pub recipients: Vec<SlaRecipient>,
    /// Tick reference time, used to compute the overdue duration.
    pub reference: Timestamp,
}

/// A resolved SLA alert recipient.
#[derive(Debug, Clone)]
pub struct SlaRecipient {
    pub user_id: DbId,
    pub email: String,
}
