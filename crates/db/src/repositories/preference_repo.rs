//! Repository for the `notification_preferences` table.

use claimdesk_core::cadence::DigestKind;
use claimdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{DigestCandidate, NotificationPreference, UpdatePreference};

/// Column list for `notification_preferences` queries.
const COLUMNS: &str = "id, user_id, is_enabled, frequency, send_hour, send_minute, \
    weekly_anchor, timezone, channels, last_daily_sent_at, last_weekly_sent_at, \
    created_at, updated_at";

/// Candidate projection shared by the enumeration queries.
const CANDIDATE_COLUMNS: &str = "u.id AS user_id, u.tenant_id, u.email, u.display_name, u.role, \
    t.name AS tenant_name, t.send_empty_digest";

/// Provides CRUD operations for per-user notification settings.
pub struct PreferenceRepo;

impl PreferenceRepo {
    /// Get the preference row for a user.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<NotificationPreference>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_preferences WHERE user_id = $1");
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or update a user's preference.
    ///
    /// Uses `COALESCE` to only overwrite fields that are `Some` in the input.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        input: &UpdatePreference,
    ) -> Result<NotificationPreference, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_preferences \
                (user_id, is_enabled, frequency, send_hour, send_minute, weekly_anchor, timezone, channels) \
             VALUES ($1, COALESCE($2, true), COALESCE($3, 'daily'), COALESCE($4, 8::smallint), \
                     COALESCE($5, 0::smallint), COALESCE($6, 1::smallint), COALESCE($7, 'UTC'), \
                     COALESCE($8, '[\"email\"]'::jsonb)) \
             ON CONFLICT (user_id) DO UPDATE SET \
                is_enabled = COALESCE($2, notification_preferences.is_enabled), \
                frequency = COALESCE($3, notification_preferences.frequency), \
                send_hour = COALESCE($4, notification_preferences.send_hour), \
                send_minute = COALESCE($5, notification_preferences.send_minute), \
                weekly_anchor = COALESCE($6, notification_preferences.weekly_anchor), \
                timezone = COALESCE($7, notification_preferences.timezone), \
                channels = COALESCE($8, notification_preferences.channels), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreference>(&query)
            .bind(user_id)
            .bind(input.is_enabled)
            .bind(&input.frequency)
            .bind(input.send_hour)
            .bind(input.send_minute)
            .bind(input.weekly_anchor)
            .bind(&input.timezone)
            .bind(&input.channels)
            .fetch_one(pool)
            .await
    }

    /// List digest candidates: enabled preferences with the requested
    /// frequency, joined against active users and active tenants.
    ///
    /// `tenant_id` / `user_id` narrow the enumeration for manual triggers;
    /// `None` means no filter. Due-ness is evaluated by the caller because
    /// it depends on the user's timezone.
    pub async fn list_digest_candidates(
        pool: &PgPool,
        kind: DigestKind,
        tenant_id: Option<DbId>,
        user_id: Option<DbId>,
    ) -> Result<Vec<DigestCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT {CANDIDATE_COLUMNS}, \
                    p.frequency, p.send_hour, p.send_minute, p.weekly_anchor, p.timezone, p.channels \
             FROM notification_preferences p \
             JOIN users u ON u.id = p.user_id AND u.is_active = TRUE \
             JOIN tenants t ON t.id = u.tenant_id AND t.is_active = TRUE \
             WHERE p.is_enabled = TRUE \
               AND p.frequency = $1 \
               AND ($2::bigint IS NULL OR u.tenant_id = $2) \
               AND ($3::bigint IS NULL OR u.id = $3) \
             ORDER BY u.id"
        );
        sqlx::query_as::<_, DigestCandidate>(&query)
            .bind(kind.as_str())
            .bind(tenant_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Build a candidate for one specific user regardless of preference
    /// state, synthesizing defaults when no preference row exists.
    ///
    /// Used by user-scoped manual triggers, which bypass the enabled and
    /// frequency gates. Returns `None` for unknown, inactive, or
    /// deactivated-tenant users.
    pub async fn candidate_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<DigestCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT {CANDIDATE_COLUMNS}, \
                    COALESCE(p.frequency, 'daily') AS frequency, \
                    COALESCE(p.send_hour, 8::smallint) AS send_hour, \
                    COALESCE(p.send_minute, 0::smallint) AS send_minute, \
                    COALESCE(p.weekly_anchor, 1::smallint) AS weekly_anchor, \
                    COALESCE(p.timezone, 'UTC') AS timezone, \
                    COALESCE(p.channels, '[\"email\"]'::jsonb) AS channels \
             FROM users u \
             JOIN tenants t ON t.id = u.tenant_id AND t.is_active = TRUE \
             LEFT JOIN notification_preferences p ON p.user_id = u.id \
             WHERE u.id = $1 AND u.is_active = TRUE"
        );
        sqlx::query_as::<_, DigestCandidate>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Update the last-sent timestamp for the given digest kind to now.
    pub async fn mark_digest_sent(
        pool: &PgPool,
        user_id: DbId,
        kind: DigestKind,
    ) -> Result<(), sqlx::Error> {
        let column = match kind {
            DigestKind::Daily => "last_daily_sent_at",
            DigestKind::Weekly => "last_weekly_sent_at",
        };
        let query =
            format!("UPDATE notification_preferences SET {column} = NOW() WHERE user_id = $1");
        sqlx::query(&query).bind(user_id).execute(pool).await?;
        Ok(())
    }
}
