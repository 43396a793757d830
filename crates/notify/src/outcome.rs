//! Per-unit dispatch outcomes and tick summaries.
//!
//! Every layer of the engine threads a [`UnitOutcome`] upward instead of
//! incrementing shared counters; a tick's [`TickSummary`] is a pure fold
//! over the outcomes of its units.

use serde::Serialize;

// ---------------------------------------------------------------------------
// UnitOutcome
// ---------------------------------------------------------------------------

/// What happened to one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Delivered and marked.
    Sent,
    /// Nothing to do: already marked for this period, empty digest under a
    /// suppressing tenant policy, or no recipients.
    Skipped,
    /// Tenant was deactivated between enumeration and dispatch; the unit
    /// counts as neither sent nor failed.
    Excluded,
    /// Delivery or generation failed; the idempotency marker was not
    /// advanced, so the unit stays eligible on the next cadence.
    Failed,
}

/// The result of dispatching one unit.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub status: OutcomeStatus,
    pub error: Option<String>,
}

impl UnitOutcome {
    pub fn sent() -> Self {
        Self {
            status: OutcomeStatus::Sent,
            error: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: OutcomeStatus::Skipped,
            error: None,
        }
    }

    pub fn excluded() -> Self {
        Self {
            status: OutcomeStatus::Excluded,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// TickSummary
// ---------------------------------------------------------------------------

/// Aggregate result of one tick, returned to the scheduler log line or the
/// manual-trigger response.
///
/// `processed = 0` distinguishes "nothing was due" from "work was attempted
/// and failed" (`failed > 0`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl TickSummary {
    /// Fold a batch of outcomes into a summary.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = UnitOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut acc, outcome| {
                acc.processed += 1;
                match outcome.status {
                    OutcomeStatus::Sent => acc.sent += 1,
                    OutcomeStatus::Failed => {
                        acc.failed += 1;
                        if let Some(err) = outcome.error {
                            acc.errors.push(err);
                        }
                    }
                    OutcomeStatus::Skipped | OutcomeStatus::Excluded => {}
                }
                acc
            })
    }

    /// Summary for a tick that could not even enumerate its units.
    pub fn enumeration_failure(error: impl Into<String>) -> Self {
        Self {
            processed: 0,
            sent: 0,
            failed: 0,
            errors: vec![error.into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
