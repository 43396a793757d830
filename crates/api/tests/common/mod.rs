use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use claimdesk_api::auth::jwt::{encode_token, Claims, JwtConfig};
use claimdesk_api::config::ServerConfig;
use claimdesk_api::routes;
use claimdesk_api::state::AppState;
use claimdesk_core::types::DbId;
use claimdesk_notify::{EngineConfig, LifecycleNotifier, ManualTrigger, NotificationEngine};

/// Shared secret used for `/internal` routes in tests.
pub const INTERNAL_TOKEN: &str = "internal-test-token";

/// JWT secret used to sign test tokens.
pub const JWT_SECRET: &str = "test-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:4200".to_string()],
        request_timeout_secs: 30,
        internal_api_token: Some(INTERNAL_TOKEN.to_string()),
        scheduler_enabled: false,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
    }
}

/// Sign a bearer header value for the given identity.
pub fn bearer_for(user_id: DbId, tenant_id: DbId, role: &str) -> String {
    let claims = Claims {
        sub: user_id,
        tenant_id,
        role: role.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    format!("Bearer {}", encode_token(JWT_SECRET, &claims).unwrap())
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. No mailer is configured; digest
/// deliveries in API tests use the in-app channel.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let engine = Arc::new(NotificationEngine::new(
        pool.clone(),
        None,
        EngineConfig::default(),
    ));

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config),
        trigger: ManualTrigger::new(engine),
        lifecycle: LifecycleNotifier::new(pool),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:4200".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}
