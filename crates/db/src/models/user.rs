//! User entity model.

use claimdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub tenant_id: DbId,
    pub email: String,
    pub display_name: String,
    /// One of the `claimdesk_core::roles` constants.
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}
