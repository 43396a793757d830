//! Repository for the `sla_notifications` breach markers.

use claimdesk_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use super::digest_send_repo::MarkerInsert;
use super::is_unique_violation;

/// Provides the breach-marker contract for exactly-once SLA alerting.
pub struct SlaNotificationRepo;

impl SlaNotificationRepo {
    /// Check whether an alert was already recorded for this breach instant.
    pub async fn exists(
        pool: &PgPool,
        claim_id: DbId,
        breach_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM sla_notifications WHERE claim_id = $1 AND breach_at = $2",
        )
        .bind(claim_id)
        .bind(breach_at)
        .fetch_optional(pool)
        .await?;
        Ok(found.is_some())
    }

    /// Record that the breach was alerted.
    ///
    /// `uq_sla_notifications_claim_breach` rejects a second writer, which
    /// is reported as [`MarkerInsert::AlreadyRecorded`].
    pub async fn record(
        pool: &PgPool,
        claim_id: DbId,
        breach_at: Timestamp,
    ) -> Result<MarkerInsert, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO sla_notifications (claim_id, breach_at) VALUES ($1, $2)",
        )
        .bind(claim_id)
        .bind(breach_at)
        .execute(pool)
        .await;

        match result {
            Ok(_) => Ok(MarkerInsert::Recorded),
            Err(e) if is_unique_violation(&e) => Ok(MarkerInsert::AlreadyRecorded),
            Err(e) => Err(e),
        }
    }
}
