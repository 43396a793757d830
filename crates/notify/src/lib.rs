//! Claimdesk notification engine.
//!
//! The scheduled and administrative delivery machinery for digests and SLA
//! alerts, plus the synchronous claim-lifecycle fan-out:
//!
//! - [`NotificationEngine`] — enumerates due units and dispatches them with
//!   bounded concurrency, folding per-unit outcomes into a [`TickSummary`].
//! - [`Scheduler`] — owns the three clock cadences (daily, weekly, SLA) and
//!   drives [`NotificationEngine::tick`].
//! - [`ManualTrigger`] — the administrative resend gateway, sharing the
//!   engine's dispatch path and idempotency markers.
//! - [`LifecycleNotifier`] — best-effort in-app fan-out for claim events;
//!   never propagates errors to the calling transaction.
//! - [`Mailer`] / [`SmtpMailer`] — the email delivery channel.

pub mod email;
pub mod engine;
pub mod lifecycle;
pub mod outcome;
pub mod scheduler;
pub mod trigger;
pub mod unit;

pub use email::{EmailConfig, EmailError, Mailer, SmtpMailer};
pub use engine::{EngineConfig, NotificationEngine, TriggerScope};
pub use lifecycle::LifecycleNotifier;
pub use outcome::{OutcomeStatus, TickSummary, UnitOutcome};
pub use scheduler::Scheduler;
pub use trigger::ManualTrigger;
pub use unit::{DigestUnit, NotificationUnit, SlaRecipient, SlaUnit, TickKind};
