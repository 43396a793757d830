//! Well-known tenant membership role constants.
//!
//! These must match the seed data in `20260715000002_create_users.sql`.
//! Owners and admins see every claim in their tenant; agents see only the
//! claims assigned to them.

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_AGENT: &str = "agent";

/// Whether a role grants tenant-wide claim visibility.
pub fn is_manager(role: &str) -> bool {
    role == ROLE_OWNER || role == ROLE_ADMIN
}
