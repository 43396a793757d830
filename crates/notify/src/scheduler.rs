//! Clock driving for the three notification cadences.
//!
//! [`Scheduler`] is an explicit instance owning a [`CancellationToken`] and
//! the join handles of its cadence loops; `start` and `stop` are its only
//! lifecycle mutators. Each loop follows the shape of a periodic
//! `tokio::select!` between cancellation and an hourly interval, and the
//! engine tick itself is never raced against cancellation, so an in-flight
//! tick always drains before the loop exits.
//!
//! All three cadences run hourly at staggered minute offsets. Due-ness is
//! evaluated per user inside the tick, so the hourly clock is a coarse
//! match window: the daily and weekly checks pick up every user whose
//! preferred send instant has passed, and the idempotency markers guarantee
//! nobody is sent twice within a period. The weekly check shares the hourly
//! clock because per-user anchor days cannot all be honoured by a single
//! weekly firing.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use chrono::{Timelike, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::NotificationEngine;
use crate::unit::TickKind;

/// How often each cadence loop fires.
const CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Minute-of-hour offsets stagger the cadences so the SLA check does not
/// collide with the daily check.
const DAILY_OFFSET_MIN: u32 = 0;
const WEEKLY_OFFSET_MIN: u32 = 20;
const SLA_OFFSET_MIN: u32 = 40;

/// Owns the three cadence loops driving [`NotificationEngine::tick`].
pub struct Scheduler {
    engine: Arc<NotificationEngine>,
    cancel: CancellationToken,
    handles: StdMutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Create a scheduler around an engine. Nothing runs until
    /// [`start`](Self::start) is called.
    pub fn new(engine: Arc<NotificationEngine>) -> Self {
        Self {
            engine,
            cancel: CancellationToken::new(),
            handles: StdMutex::new(Vec::new()),
        }
    }

    /// Register the three cadences against the clock.
    ///
    /// Calling `start` on an already-started scheduler is a no-op.
    pub fn start(&self) {
        let mut handles = self.handles.lock().expect("scheduler handle lock");
        if !handles.is_empty() {
            tracing::warn!("Scheduler already started");
            return;
        }
        for kind in [TickKind::Daily, TickKind::Weekly, TickKind::Sla] {
            handles.push(tokio::spawn(cadence_loop(
                Arc::clone(&self.engine),
                kind,
                self.cancel.clone(),
            )));
        }
        tracing::info!(
            interval_secs = CHECK_INTERVAL.as_secs(),
            "Notification scheduler started"
        );
    }

    /// Cancel future firings and wait for the cadence loops to exit.
    ///
    /// An in-flight tick runs to completion. The engine itself stays
    /// callable, so manual triggers keep working after `stop`.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handles: Vec<_> = {
            let mut guard = self.handles.lock().expect("scheduler handle lock");
            guard.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
        tracing::info!("Notification scheduler stopped");
    }
}

fn offset_for(kind: TickKind) -> u32 {
    match kind {
        TickKind::Daily => DAILY_OFFSET_MIN,
        TickKind::Weekly => WEEKLY_OFFSET_MIN,
        TickKind::Sla => SLA_OFFSET_MIN,
    }
}

/// Seconds from (minute, second) within the hour until the next firing of
/// a cadence slotted at `offset_min`. Always strictly positive.
fn seconds_until_slot(minute: u32, second: u32, offset_min: u32) -> u64 {
    let current = minute * 60 + second;
    let target = offset_min * 60;
    u64::from(if target > current {
        target - current
    } else {
        target + 3600 - current
    })
}

async fn cadence_loop(engine: Arc<NotificationEngine>, kind: TickKind, cancel: CancellationToken) {
    // Align the first firing to the cadence's minute slot.
    let now = Utc::now();
    let delay = Duration::from_secs(seconds_until_slot(
        now.minute(),
        now.second(),
        offset_for(kind),
    ));
    tracing::debug!(kind = %kind, delay_secs = delay.as_secs(), "Cadence loop aligned");

    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(delay) => {}
    }

    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(kind = %kind, "Cadence loop stopping");
                return;
            }
            _ = interval.tick() => {
                // The tick is not raced against cancellation: once started
                // it drains fully, and the loop re-checks on the next pass.
                let _ = engine.tick(kind, Utc::now()).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_delay_reaches_forward_to_offset() {
        // 12 minutes before the :40 slot.
        assert_eq!(seconds_until_slot(28, 0, 40), 12 * 60);
    }

    #[test]
    fn slot_delay_wraps_to_next_hour() {
        // :45 is past the :40 slot; wait 55 minutes.
        assert_eq!(seconds_until_slot(45, 0, 40), 55 * 60);
    }

    #[test]
    fn slot_delay_is_never_zero() {
        // Exactly on the slot: schedule the next hour, not now.
        assert_eq!(seconds_until_slot(40, 0, 40), 3600);
    }

    #[test]
    fn slot_delay_accounts_for_seconds() {
        assert_eq!(seconds_until_slot(39, 30, 40), 30);
    }
}
