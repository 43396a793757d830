//! Synchronous in-app fan-out for claim lifecycle events.
//!
//! Distinct from the scheduled digest path: these notifications are
//! triggered by the claims service when a claim is created, assigned, or
//! resolved, and they are best-effort by contract. A failure to write a
//! notification row is logged and swallowed, because the claim operation
//! that triggered it must succeed regardless of notification health. The
//! digest/SLA path has the opposite posture (retry via unmoved markers);
//! the asymmetry is deliberate.

use std::collections::BTreeSet;

use claimdesk_core::types::DbId;
use claimdesk_db::models::claim::Claim;
use claimdesk_db::models::notification::{KIND_INFO, KIND_SUCCESS};
use claimdesk_db::repositories::{NotificationRepo, UserRepo};
use claimdesk_db::DbPool;

/// Best-effort in-app notifier for claim lifecycle events.
#[derive(Clone)]
pub struct LifecycleNotifier {
    pool: DbPool,
}

impl LifecycleNotifier {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Notify about a newly filed claim.
    ///
    /// Recipients are the tenant's owners and admins plus any explicitly
    /// preferred user ids (e.g. a round-robin assignee), deduplicated and
    /// written in a single bulk insert. An empty recipient set is a no-op.
    pub async fn notify_new_claim(&self, claim: &Claim, preferred_user_ids: &[DbId]) {
        let managers = match UserRepo::list_tenant_managers(&self.pool, claim.tenant_id).await {
            Ok(managers) => managers,
            Err(e) => {
                tracing::warn!(
                    claim_id = claim.id,
                    error = %e,
                    "New-claim fan-out could not resolve recipients"
                );
                return;
            }
        };

        let recipients =
            unique_recipients(managers.iter().map(|u| u.id), preferred_user_ids);
        if recipients.is_empty() {
            return;
        }

        let title = format!("New claim {}", claim.reference);
        let body = format!("{} — filed by {}", claim.title, claim.customer_name);

        if let Err(e) = NotificationRepo::create_bulk(
            &self.pool,
            claim.tenant_id,
            &recipients,
            &title,
            &body,
            KIND_INFO,
        )
        .await
        {
            tracing::warn!(
                claim_id = claim.id,
                recipients = recipients.len(),
                error = %e,
                "Failed to write new-claim notifications"
            );
        }
    }

    /// Notify a user that a claim was assigned to them. No-op without a
    /// user id.
    pub async fn notify_claim_assigned(&self, user_id: Option<DbId>, claim: &Claim) {
        let Some(user_id) = user_id else { return };
        let title = format!("Claim {} assigned to you", claim.reference);
        self.write_single(user_id, claim, title, KIND_INFO).await;
    }

    /// Notify a user that their claim was resolved. No-op without a user id.
    pub async fn notify_claim_resolved(&self, user_id: Option<DbId>, claim: &Claim) {
        let Some(user_id) = user_id else { return };
        let title = format!("Claim {} resolved", claim.reference);
        self.write_single(user_id, claim, title, KIND_SUCCESS).await;
    }

    async fn write_single(&self, user_id: DbId, claim: &Claim, title: String, kind: &str) {
        let body = format!("{} — {}", claim.title, claim.customer_name);
        if let Err(e) = NotificationRepo::create(
            &self.pool,
            claim.tenant_id,
            user_id,
            &title,
            &body,
            kind,
        )
        .await
        {
            tracing::warn!(
                claim_id = claim.id,
                user_id,
                error = %e,
                "Failed to write lifecycle notification"
            );
        }
    }
}

/// Merge manager and preferred recipient ids, keeping each id once.
///
/// Order is stable: managers first, then preferred ids not already present.
pub fn unique_recipients(
    managers: impl IntoIterator<Item = DbId>,
    preferred: &[DbId],
) -> Vec<DbId> {
    let mut seen = BTreeSet::new();
    let mut recipients = Vec::new();
    for id in managers.into_iter().chain(preferred.iter().copied()) {
        if seen.insert(id) {
            recipients.push(id);
        }
    }
    recipients
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_ids_are_written_once() {
        let recipients = unique_recipients([1, 2, 3], &[3, 4, 2]);
        assert_eq!(recipients, vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_inputs_produce_no_recipients() {
        assert!(unique_recipients([], &[]).is_empty());
    }

    #[test]
    fn preferred_only_recipients_survive() {
        assert_eq!(unique_recipients([], &[9, 9, 7]), vec![9, 7]);
    }
}
