//! Integration tests for the notification-engine repository contracts:
//! idempotency markers, candidate enumeration, and claim aggregation.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use claimdesk_core::cadence::{DigestKind, Window};
use claimdesk_db::models::notification::UpdatePreference;
use claimdesk_db::models::tenant::Tenant;
use claimdesk_db::models::user::User;
use claimdesk_db::repositories::{
    ClaimRepo, DigestSendRepo, MarkerInsert, NotificationRepo, PreferenceRepo,
    SlaNotificationRepo, TenantRepo, UserRepo,
};
use sqlx::PgPool;

async fn seed_tenant_and_user(pool: &PgPool) -> (Tenant, User) {
    let tenant = TenantRepo::create(pool, "Acme Insurance", false)
        .await
        .unwrap();
    let user = UserRepo::create(pool, tenant.id, "ana@acme.test", "Ana", "admin")
        .await
        .unwrap();
    (tenant, user)
}

fn default_preference() -> UpdatePreference {
    UpdatePreference {
        is_enabled: None,
        frequency: None,
        send_hour: None,
        send_minute: None,
        weekly_anchor: None,
        timezone: None,
        channels: None,
    }
}

// ---------------------------------------------------------------------------
// Idempotency markers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn digest_marker_rejects_second_writer(pool: PgPool) {
    let (_, user) = seed_tenant_and_user(&pool).await;

    let first = DigestSendRepo::record(&pool, user.id, DigestKind::Daily, "2026-08-04")
        .await
        .unwrap();
    assert_matches!(first, MarkerInsert::Recorded);

    let second = DigestSendRepo::record(&pool, user.id, DigestKind::Daily, "2026-08-04")
        .await
        .unwrap();
    assert_matches!(second, MarkerInsert::AlreadyRecorded);

    assert!(
        DigestSendRepo::exists(&pool, user.id, DigestKind::Daily, "2026-08-04")
            .await
            .unwrap()
    );
    // A different period is a different marker.
    assert!(
        !DigestSendRepo::exists(&pool, user.id, DigestKind::Daily, "2026-08-05")
            .await
            .unwrap()
    );
    // So is a different kind for the same key space.
    assert!(
        !DigestSendRepo::exists(&pool, user.id, DigestKind::Weekly, "2026-08-04")
            .await
            .unwrap()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sla_marker_is_keyed_by_breach_instant(pool: PgPool) {
    let (tenant, user) = seed_tenant_and_user(&pool).await;
    let breach = Utc.with_ymd_and_hms(2026, 8, 4, 9, 0, 0).unwrap();
    let claim = ClaimRepo::create(
        &pool,
        tenant.id,
        "CLM-1",
        "Cracked windshield",
        "J. Rivera",
        Some(user.id),
        Some(breach),
    )
    .await
    .unwrap();

    assert_matches!(
        SlaNotificationRepo::record(&pool, claim.id, breach).await.unwrap(),
        MarkerInsert::Recorded
    );
    assert_matches!(
        SlaNotificationRepo::record(&pool, claim.id, breach).await.unwrap(),
        MarkerInsert::AlreadyRecorded
    );

    // A renegotiated deadline is a new breach instant and alerts again.
    let later_breach = breach + Duration::hours(24);
    assert_matches!(
        SlaNotificationRepo::record(&pool, claim.id, later_breach)
            .await
            .unwrap(),
        MarkerInsert::Recorded
    );
}

// ---------------------------------------------------------------------------
// Claim aggregation and SLA enumeration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn aggregate_counts_applies_assignee_scope(pool: PgPool) {
    let (tenant, admin) = seed_tenant_and_user(&pool).await;
    let agent = UserRepo::create(&pool, tenant.id, "ben@acme.test", "Ben", "agent")
        .await
        .unwrap();

    let now = Utc::now();
    ClaimRepo::create(&pool, tenant.id, "CLM-1", "A", "", Some(agent.id), None)
        .await
        .unwrap();
    ClaimRepo::create(&pool, tenant.id, "CLM-2", "B", "", Some(admin.id), None)
        .await
        .unwrap();
    ClaimRepo::create(&pool, tenant.id, "CLM-3", "C", "", None, None)
        .await
        .unwrap();

    let window = Window {
        start: now - Duration::hours(1),
        end: now + Duration::hours(1),
    };

    // Tenant-wide view sees all three.
    let all = ClaimRepo::aggregate_counts(&pool, tenant.id, None, window)
        .await
        .unwrap();
    assert_eq!(all.opened, 3);
    assert_eq!(all.open_total, 3);

    // Agent view sees only the claim assigned to them.
    let scoped = ClaimRepo::aggregate_counts(&pool, tenant.id, Some(agent.id), window)
        .await
        .unwrap();
    assert_eq!(scoped.opened, 1);
    assert_eq!(scoped.open_total, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn overdue_listing_skips_alerted_claims_and_inactive_tenants(pool: PgPool) {
    let (tenant, user) = seed_tenant_and_user(&pool).await;
    let now = Utc::now();
    let breach = now - Duration::hours(2);

    let breached = ClaimRepo::create(
        &pool,
        tenant.id,
        "CLM-1",
        "Breached",
        "",
        Some(user.id),
        Some(breach),
    )
    .await
    .unwrap();
    // Not yet due.
    ClaimRepo::create(
        &pool,
        tenant.id,
        "CLM-2",
        "On track",
        "",
        Some(user.id),
        Some(now + Duration::hours(2)),
    )
    .await
    .unwrap();

    let overdue = ClaimRepo::list_overdue_unresolved(&pool, now).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, breached.id);
    assert_eq!(overdue[0].tenant_name, "Acme Insurance");

    // Once alerted, the claim drops out of the enumeration.
    SlaNotificationRepo::record(&pool, breached.id, breach)
        .await
        .unwrap();
    assert!(ClaimRepo::list_overdue_unresolved(&pool, now)
        .await
        .unwrap()
        .is_empty());

    // A deactivated tenant's claims are never enumerated.
    let other = TenantRepo::create(&pool, "Gone Corp", false).await.unwrap();
    let other_user = UserRepo::create(&pool, other.id, "zoe@gone.test", "Zoe", "owner")
        .await
        .unwrap();
    ClaimRepo::create(
        &pool,
        other.id,
        "CLM-9",
        "Orphaned",
        "",
        Some(other_user.id),
        Some(breach),
    )
    .await
    .unwrap();
    TenantRepo::set_active(&pool, other.id, false).await.unwrap();

    assert!(ClaimRepo::list_overdue_unresolved(&pool, now)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// In-app bulk writes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_create_writes_one_row_per_recipient(pool: PgPool) {
    let (tenant, a) = seed_tenant_and_user(&pool).await;
    let b = UserRepo::create(&pool, tenant.id, "ben@acme.test", "Ben", "agent")
        .await
        .unwrap();

    let written =
        NotificationRepo::create_bulk(&pool, tenant.id, &[a.id, b.id], "New claim", "", "info")
            .await
            .unwrap();
    assert_eq!(written, 2);

    assert_eq!(NotificationRepo::unread_count(&pool, a.id).await.unwrap(), 1);
    assert_eq!(NotificationRepo::unread_count(&pool, b.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_create_with_no_recipients_writes_nothing(pool: PgPool) {
    let (tenant, _) = seed_tenant_and_user(&pool).await;
    let written = NotificationRepo::create_bulk(&pool, tenant.id, &[], "x", "", "info")
        .await
        .unwrap();
    assert_eq!(written, 0);
}

// ---------------------------------------------------------------------------
// Preferences and candidate enumeration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn preference_upsert_only_overwrites_provided_fields(pool: PgPool) {
    let (_, user) = seed_tenant_and_user(&pool).await;

    let created = PreferenceRepo::upsert(
        &pool,
        user.id,
        &UpdatePreference {
            send_hour: Some(9),
            timezone: Some("Europe/Berlin".into()),
            ..default_preference()
        },
    )
    .await
    .unwrap();
    assert_eq!(created.send_hour, 9);
    assert_eq!(created.frequency, "daily");

    // A partial update keeps every untouched field.
    let updated = PreferenceRepo::upsert(
        &pool,
        user.id,
        &UpdatePreference {
            frequency: Some("weekly".into()),
            ..default_preference()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.frequency, "weekly");
    assert_eq!(updated.send_hour, 9);
    assert_eq!(updated.timezone, "Europe/Berlin");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn candidate_enumeration_honours_frequency_and_tenant_state(pool: PgPool) {
    let (tenant, daily_user) = seed_tenant_and_user(&pool).await;
    let weekly_user = UserRepo::create(&pool, tenant.id, "ben@acme.test", "Ben", "agent")
        .await
        .unwrap();

    PreferenceRepo::upsert(&pool, daily_user.id, &default_preference())
        .await
        .unwrap();
    PreferenceRepo::upsert(
        &pool,
        weekly_user.id,
        &UpdatePreference {
            frequency: Some("weekly".into()),
            ..default_preference()
        },
    )
    .await
    .unwrap();

    let daily =
        PreferenceRepo::list_digest_candidates(&pool, DigestKind::Daily, None, None)
            .await
            .unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].user_id, daily_user.id);

    let scoped =
        PreferenceRepo::list_digest_candidates(&pool, DigestKind::Weekly, Some(tenant.id), None)
            .await
            .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].user_id, weekly_user.id);

    // Deactivating the tenant empties the enumeration entirely.
    TenantRepo::set_active(&pool, tenant.id, false).await.unwrap();
    assert!(
        PreferenceRepo::list_digest_candidates(&pool, DigestKind::Daily, None, None)
            .await
            .unwrap()
            .is_empty()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn candidate_for_user_synthesizes_defaults(pool: PgPool) {
    let (_, user) = seed_tenant_and_user(&pool).await;

    // No preference row saved at all.
    let candidate = PreferenceRepo::candidate_for_user(&pool, user.id)
        .await
        .unwrap()
        .expect("active user should resolve");
    assert_eq!(candidate.send_hour, 8);
    assert_eq!(candidate.timezone, "UTC");
    assert_eq!(candidate.channel_names(), vec!["email".to_string()]);
}
