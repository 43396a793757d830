//! Repository for the `users` table.

use claimdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "id, tenant_id, email, display_name, role, is_active, created_at";

/// Provides read/write operations for tenant members.
pub struct UserRepo;

impl UserRepo {
    /// Create a user within a tenant, returning the full row.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        email: &str,
        display_name: &str,
        role: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (tenant_id, email, display_name, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(tenant_id)
            .bind(email)
            .bind(display_name)
            .bind(role)
            .fetch_one(pool)
            .await
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the active owners and admins of a tenant.
    ///
    /// These are the default recipients of new-claim fan-out and of SLA
    /// alerts for unassigned claims.
    pub async fn list_tenant_managers(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE tenant_id = $1 AND is_active = TRUE AND role IN ($2, $3) \
             ORDER BY id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(tenant_id)
            .bind(claimdesk_core::roles::ROLE_OWNER)
            .bind(claimdesk_core::roles::ROLE_ADMIN)
            .fetch_all(pool)
            .await
    }
}
