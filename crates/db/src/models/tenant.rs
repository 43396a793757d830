//! Tenant entity model.

use claimdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tenants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tenant {
    pub id: DbId,
    pub name: String,
    pub is_active: bool,
    /// When true, users receive an explicit "all clear" digest even for a
    /// window with no claim activity.
    pub send_empty_digest: bool,
    pub created_at: Timestamp,
}
