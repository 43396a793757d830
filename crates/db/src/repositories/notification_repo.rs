//! Repository for the `notifications` table (in-app rows).

use claimdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::InAppNotification;

/// Column list for `notifications` queries.
const COLUMNS: &str =
    "id, tenant_id, user_id, title, body, kind, is_read, read_at, created_at";

/// Provides CRUD operations for in-app notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a notification for a single user, returning the generated ID.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        user_id: DbId,
        title: &str,
        body: &str,
        kind: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (tenant_id, user_id, title, body, kind) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(title)
        .bind(body)
        .bind(kind)
        .fetch_one(pool)
        .await
    }

    /// Create the same notification for several users in a single statement.
    ///
    /// Returns the number of rows written. An empty recipient list writes
    /// nothing and returns 0.
    pub async fn create_bulk(
        pool: &PgPool,
        tenant_id: DbId,
        user_ids: &[DbId],
        title: &str,
        body: &str,
        kind: &str,
    ) -> Result<u64, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO notifications (tenant_id, user_id, title, body, kind) \
             SELECT $1, uid, $3, $4, $5 FROM UNNEST($2::bigint[]) AS uid",
        )
        .bind(tenant_id)
        .bind(user_ids)
        .bind(title)
        .bind(body)
        .bind(kind)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List notifications for a user.
    ///
    /// When `unread_only` is `true`, only notifications with `is_read = false`
    /// are returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InAppNotification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, InAppNotification>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns `true` if the notification was found for the given user and
    /// updated, `false` otherwise.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND is_read = false",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Get the number of unread notifications for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
