//! Repository for the `digest_sends` idempotency markers.

use claimdesk_core::cadence::DigestKind;
use claimdesk_core::types::DbId;
use sqlx::PgPool;

use super::is_unique_violation;

/// Result of a marker write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerInsert {
    /// This writer created the marker.
    Recorded,
    /// A concurrent writer got there first; the unit was already handled.
    AlreadyRecorded,
}

/// Provides the sent-marker contract for digest idempotency.
pub struct DigestSendRepo;

impl DigestSendRepo {
    /// Check whether a digest was already sent for this period.
    pub async fn exists(
        pool: &PgPool,
        user_id: DbId,
        kind: DigestKind,
        period_key: &str,
    ) -> Result<bool, sqlx::Error> {
        let found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM digest_sends \
             WHERE user_id = $1 AND kind = $2 AND period_key = $3",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(period_key)
        .fetch_optional(pool)
        .await?;
        Ok(found.is_some())
    }

    /// Record that a digest was sent for this period.
    ///
    /// The `uq_digest_sends_user_kind_period` constraint rejects a second
    /// writer; that outcome is surfaced as [`MarkerInsert::AlreadyRecorded`]
    /// rather than an error.
    pub async fn record(
        pool: &PgPool,
        user_id: DbId,
        kind: DigestKind,
        period_key: &str,
    ) -> Result<MarkerInsert, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO digest_sends (user_id, kind, period_key) \
             VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(period_key)
        .execute(pool)
        .await;

        match result {
            Ok(_) => Ok(MarkerInsert::Recorded),
            Err(e) if is_unique_violation(&e) => Ok(MarkerInsert::AlreadyRecorded),
            Err(e) => Err(e),
        }
    }
}
