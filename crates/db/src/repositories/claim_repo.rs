//! Repository for the `claims` table.
//!
//! The engine only reads claim data; writes here exist for the claim-event
//! ingress and the integration tests that seed fixtures.

use claimdesk_core::cadence::Window;
use claimdesk_core::summary::DigestCounts;
use claimdesk_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::claim::{Claim, OverdueClaim};

/// Column list for `claims` queries.
const COLUMNS: &str = "id, tenant_id, reference, title, customer_name, status, \
    assigned_user_id, sla_due_at, resolved_at, created_at, updated_at";

/// Provides claim reads for digest aggregation and SLA enumeration.
pub struct ClaimRepo;

impl ClaimRepo {
    /// Insert a claim row (test fixtures and seed tooling).
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        reference: &str,
        title: &str,
        customer_name: &str,
        assigned_user_id: Option<DbId>,
        sla_due_at: Option<Timestamp>,
    ) -> Result<Claim, sqlx::Error> {
        let query = format!(
            "INSERT INTO claims (tenant_id, reference, title, customer_name, assigned_user_id, sla_due_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Claim>(&query)
            .bind(tenant_id)
            .bind(reference)
            .bind(title)
            .bind(customer_name)
            .bind(assigned_user_id)
            .bind(sla_due_at)
            .fetch_one(pool)
            .await
    }

    /// Find a claim by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Claim>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM claims WHERE id = $1");
        sqlx::query_as::<_, Claim>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Aggregate the digest counts for a tenant over a window.
    ///
    /// `visible_to` applies the tenant-scoped access rule: agents see only
    /// claims assigned to them (`Some(user_id)`), owners and admins see the
    /// whole tenant (`None`). `opened`/`resolved` are window-scoped; the
    /// backlog and SLA figures describe the state at the window end.
    pub async fn aggregate_counts(
        pool: &PgPool,
        tenant_id: DbId,
        visible_to: Option<DbId>,
        window: Window,
    ) -> Result<DigestCounts, sqlx::Error> {
        let row: (i64, i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
                COUNT(*) FILTER (WHERE created_at >= $2 AND created_at < $3), \
                COUNT(*) FILTER (WHERE resolved_at >= $2 AND resolved_at < $3), \
                COUNT(*) FILTER (WHERE status IN ('open', 'in_progress')), \
                COUNT(*) FILTER (WHERE status IN ('open', 'in_progress') \
                    AND sla_due_at IS NOT NULL AND sla_due_at <= $3), \
                COUNT(*) FILTER (WHERE status IN ('open', 'in_progress') \
                    AND sla_due_at > $3 AND sla_due_at <= $3 + INTERVAL '24 hours') \
             FROM claims \
             WHERE tenant_id = $1 \
               AND ($4::bigint IS NULL OR assigned_user_id = $4)",
        )
        .bind(tenant_id)
        .bind(window.start)
        .bind(window.end)
        .bind(visible_to)
        .fetch_one(pool)
        .await?;

        Ok(DigestCounts {
            opened: row.0,
            resolved: row.1,
            open_total: row.2,
            overdue: row.3,
            due_soon: row.4,
        })
    }

    /// List unresolved claims whose SLA deadline has passed and which have
    /// no alert recorded for that breach instant yet.
    ///
    /// Deactivated tenants are excluded at enumeration; the anti-join makes
    /// repeated SLA ticks idempotent without any engine-side bookkeeping.
    pub async fn list_overdue_unresolved(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<OverdueClaim>, sqlx::Error> {
        sqlx::query_as::<_, OverdueClaim>(
            "SELECT c.id, c.tenant_id, c.reference, c.title, c.customer_name, \
                    c.assigned_user_id, c.sla_due_at, t.name AS tenant_name \
             FROM claims c \
             JOIN tenants t ON t.id = c.tenant_id AND t.is_active = TRUE \
             WHERE c.status IN ('open', 'in_progress') \
               AND c.sla_due_at IS NOT NULL \
               AND c.sla_due_at <= $1 \
               AND NOT EXISTS (SELECT 1 FROM sla_notifications s \
                               WHERE s.claim_id = c.id AND s.breach_at = c.sla_due_at) \
             ORDER BY c.sla_due_at",
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }
}
