//! Repository for the `tenants` table.

use claimdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::tenant::Tenant;

/// Column list for `tenants` queries.
const COLUMNS: &str = "id, name, is_active, send_empty_digest, created_at";

/// Provides read/write operations for tenants.
pub struct TenantRepo;

impl TenantRepo {
    /// Create a tenant, returning the full row.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        send_empty_digest: bool,
    ) -> Result<Tenant, sqlx::Error> {
        let query = format!(
            "INSERT INTO tenants (name, send_empty_digest) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tenant>(&query)
            .bind(name)
            .bind(send_empty_digest)
            .fetch_one(pool)
            .await
    }

    /// Find a tenant by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tenant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tenants WHERE id = $1");
        sqlx::query_as::<_, Tenant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Activate or deactivate a tenant.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tenants SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(())
    }
}
