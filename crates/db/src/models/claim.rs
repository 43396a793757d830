//! Claim entity model.
//!
//! Claims are owned by the CRUD backend; the notification engine treats
//! this table as a read-only data source.

use claimdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `claims` table.
///
/// Status values are constrained by `ck_claims_status`:
/// `open`, `in_progress`, `resolved`, `closed`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Claim {
    pub id: DbId,
    pub tenant_id: DbId,
    pub reference: String,
    pub title: String,
    pub customer_name: String,
    pub status: String,
    pub assigned_user_id: Option<DbId>,
    pub sla_due_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A breaching claim joined with its tenant, as enumerated by the SLA tick.
#[derive(Debug, Clone, FromRow)]
pub struct OverdueClaim {
    pub id: DbId,
    pub tenant_id: DbId,
    pub reference: String,
    pub title: String,
    pub customer_name: String,
    pub assigned_user_id: Option<DbId>,
    /// The breach instant; doubles as the idempotency key component.
    pub sla_due_at: Timestamp,
    pub tenant_name: String,
}
