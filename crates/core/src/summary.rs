//! Digest and SLA-alert content payloads.
//!
//! Content generation is split in two: the `db` crate produces the raw
//! numbers, and the pure functions here turn them into the rendered
//! subject/body pair. Rendering is deterministic for a given payload so it
//! can be tested without mocking delivery.

use chrono::Duration;
use serde::Serialize;

use crate::cadence::DigestKind;

// ---------------------------------------------------------------------------
// Digest payload
// ---------------------------------------------------------------------------

/// Claim counts backing a daily or weekly digest.
///
/// `opened` and `resolved` are scoped to the digest window; the remaining
/// fields describe the current backlog at generation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestCounts {
    /// Claims opened within the window.
    pub opened: i64,
    /// Claims resolved within the window.
    pub resolved: i64,
    /// Currently open or in-progress claims.
    pub open_total: i64,
    /// Open claims past their SLA deadline.
    pub overdue: i64,
    /// Open claims whose SLA deadline falls within the next 24 hours.
    pub due_soon: i64,
}

impl DigestCounts {
    /// True when there is nothing to report: no window activity and no
    /// claim needing SLA attention. Tenants suppress empty digests unless
    /// their `send_empty_digest` policy asks for an explicit all-clear.
    pub fn is_empty(&self) -> bool {
        self.opened == 0 && self.resolved == 0 && self.overdue == 0 && self.due_soon == 0
    }
}

/// Render the subject and plain-text body of a digest.
pub fn render_digest(kind: DigestKind, tenant_name: &str, counts: &DigestCounts) -> (String, String) {
    let cadence = match kind {
        DigestKind::Daily => "Daily",
        DigestKind::Weekly => "Weekly",
    };
    let subject = format!("[Claimdesk] {cadence} claim digest — {tenant_name}");

    let body = if counts.is_empty() {
        format!(
            "{cadence} summary for {tenant_name}\n\n\
             All clear: no claim activity and no SLA deadlines at risk.\n\
             Open claims in backlog: {}\n",
            counts.open_total
        )
    } else {
        format!(
            "{cadence} summary for {tenant_name}\n\n\
             New claims:          {}\n\
             Resolved claims:     {}\n\
             Open claims total:   {}\n\
             Past SLA deadline:   {}\n\
             SLA due within 24h:  {}\n",
            counts.opened, counts.resolved, counts.open_total, counts.overdue, counts.due_soon
        )
    };

    (subject, body)
}

// ---------------------------------------------------------------------------
// SLA alert payload
// ---------------------------------------------------------------------------

/// The single breaching claim carried by an SLA alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlaBreach {
    pub claim_reference: String,
    pub claim_title: String,
    pub customer_name: String,
    /// How long the claim has been past its deadline at generation time.
    #[serde(skip)]
    pub overdue: Duration,
}

/// Render the subject and plain-text body of an SLA breach alert.
pub fn render_sla_alert(tenant_name: &str, breach: &SlaBreach) -> (String, String) {
    let subject = format!(
        "[Claimdesk] SLA breached: {} — {tenant_name}",
        breach.claim_reference
    );
    let body = format!(
        "The SLA deadline for claim {} has been exceeded.\n\n\
         Claim:    {}\n\
         Customer: {}\n\
         Overdue:  {}\n\n\
         Please review the claim and update its status.\n",
        breach.claim_reference,
        breach.claim_title,
        breach.customer_name,
        format_overdue(breach.overdue),
    );
    (subject, body)
}

/// Human-readable duration, largest two units only.
pub fn format_overdue(overdue: Duration) -> String {
    let minutes = overdue.num_minutes().max(0);
    let (days, hours, mins) = (minutes / 1440, (minutes % 1440) / 60, minutes % 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_with_only_backlog_are_empty() {
        let counts = DigestCounts {
            open_total: 7,
            ..Default::default()
        };
        assert!(counts.is_empty());
    }

    #[test]
    fn counts_with_window_activity_are_not_empty() {
        let counts = DigestCounts {
            resolved: 1,
            ..Default::default()
        };
        assert!(!counts.is_empty());
    }

    #[test]
    fn digest_body_lists_all_counts() {
        let counts = DigestCounts {
            opened: 3,
            resolved: 2,
            open_total: 11,
            overdue: 1,
            due_soon: 4,
        };
        let (subject, body) = render_digest(DigestKind::Daily, "Acme Insurance", &counts);
        assert_eq!(subject, "[Claimdesk] Daily claim digest — Acme Insurance");
        assert!(body.contains("New claims:          3"));
        assert!(body.contains("Resolved claims:     2"));
        assert!(body.contains("Past SLA deadline:   1"));
    }

    #[test]
    fn empty_digest_renders_all_clear() {
        let counts = DigestCounts {
            open_total: 2,
            ..Default::default()
        };
        let (_, body) = render_digest(DigestKind::Weekly, "Acme", &counts);
        assert!(body.contains("All clear"));
        assert!(body.contains("backlog: 2"));
    }

    #[test]
    fn sla_alert_names_claim_and_overdue_duration() {
        let breach = SlaBreach {
            claim_reference: "CLM-1042".into(),
            claim_title: "Water damage, unit 4B".into(),
            customer_name: "J. Rivera".into(),
            overdue: Duration::hours(26),
        };
        let (subject, body) = render_sla_alert("Acme", &breach);
        assert!(subject.contains("CLM-1042"));
        assert!(body.contains("Overdue:  1d 2h"));
    }

    #[test]
    fn overdue_formatting_picks_sensible_units() {
        assert_eq!(format_overdue(Duration::minutes(45)), "45m");
        assert_eq!(format_overdue(Duration::minutes(185)), "3h 5m");
        assert_eq!(format_overdue(Duration::days(2) + Duration::hours(4)), "2d 4h");
        assert_eq!(format_overdue(Duration::minutes(-10)), "0m");
    }
}
