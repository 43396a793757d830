//! Notification entity models and DTOs.

use claimdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// In-app notification kind column values (see `ck_notifications_kind`).
pub const KIND_INFO: &str = "info";
pub const KIND_SUCCESS: &str = "success";
pub const KIND_WARNING: &str = "warning";
pub const KIND_ERROR: &str = "error";

/// A row from the `notifications` table (in-app bell entries).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InAppNotification {
    pub id: DbId,
    pub tenant_id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A row from the `notification_preferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationPreference {
    pub id: DbId,
    pub user_id: DbId,
    pub is_enabled: bool,
    pub frequency: String,
    pub send_hour: i16,
    pub send_minute: i16,
    pub weekly_anchor: i16,
    pub timezone: String,
    pub channels: serde_json::Value,
    pub last_daily_sent_at: Option<Timestamp>,
    pub last_weekly_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A digest candidate: preference joined with its active user and tenant.
///
/// Projection consumed by the engine's enumeration step; due-ness is then
/// evaluated in Rust because it depends on the user's timezone.
#[derive(Debug, Clone, FromRow)]
pub struct DigestCandidate {
    pub user_id: DbId,
    pub tenant_id: DbId,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub tenant_name: String,
    pub send_empty_digest: bool,
    pub frequency: String,
    pub send_hour: i16,
    pub send_minute: i16,
    pub weekly_anchor: i16,
    pub timezone: String,
    pub channels: serde_json::Value,
}

impl DigestCandidate {
    /// Decode the JSONB channels array, defaulting to email on a malformed
    /// value rather than dropping the user from the run.
    pub fn channel_names(&self) -> Vec<String> {
        serde_json::from_value(self.channels.clone())
            .unwrap_or_else(|_| vec![claimdesk_core::channels::CHANNEL_EMAIL.to_string()])
    }
}

/// DTO for updating a notification preference.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePreference {
    pub is_enabled: Option<bool>,
    /// `daily`, `weekly`, or `none`.
    pub frequency: Option<String>,
    #[validate(range(min = 0, max = 23))]
    pub send_hour: Option<i16>,
    #[validate(range(min = 0, max = 59))]
    pub send_minute: Option<i16>,
    /// ISO weekday, 1 = Monday .. 7 = Sunday.
    #[validate(range(min = 1, max = 7))]
    pub weekly_anchor: Option<i16>,
    pub timezone: Option<String>,
    pub channels: Option<serde_json::Value>,
}
