//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod claim_repo;
pub mod digest_send_repo;
pub mod notification_repo;
pub mod preference_repo;
pub mod sla_notification_repo;
pub mod tenant_repo;
pub mod user_repo;

pub use claim_repo::ClaimRepo;
pub use digest_send_repo::{DigestSendRepo, MarkerInsert};
pub use notification_repo::NotificationRepo;
pub use preference_repo::PreferenceRepo;
pub use sla_notification_repo::SlaNotificationRepo;
pub use tenant_repo::TenantRepo;
pub use user_repo::UserRepo;

/// PostgreSQL unique-constraint violation (error code 23505).
///
/// Marker writes rely on this to detect a concurrent writer that got there
/// first; the engine treats that as "already handled", not as a failure.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
