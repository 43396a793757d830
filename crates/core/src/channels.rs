//! Well-known delivery channel name constants.
//!
//! These must match the channel values stored in the
//! `notification_preferences.channels` JSONB array and referenced by the
//! dispatch engine and API handlers.

/// Email delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// In-app notification persisted for the notification bell UI, which
/// the frontend reads by polling.
pub const CHANNEL_IN_APP: &str = "in_app";
