//! Standalone notification worker.
//!
//! Runs the scheduler cadences outside the API process for deployments
//! that separate the web tier from background work. Set
//! `SCHEDULER_ENABLED=false` on the API when this binary owns the clock;
//! the idempotency markers absorb any overlap either way.

use std::sync::Arc;

use claimdesk_notify::{
    EmailConfig, EngineConfig, Mailer, NotificationEngine, Scheduler, SmtpMailer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claimdesk_worker=debug,claimdesk_notify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = claimdesk_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");

    claimdesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let mailer: Option<Arc<dyn Mailer>> = match EmailConfig::from_env() {
        Some(email_config) => Some(Arc::new(SmtpMailer::new(email_config))),
        None => {
            tracing::warn!("SMTP_HOST not set; email delivery disabled");
            None
        }
    };

    let engine = Arc::new(NotificationEngine::new(
        pool,
        mailer,
        EngineConfig::from_env(),
    ));
    let scheduler = Scheduler::new(engine);
    scheduler.start();

    shutdown_signal().await;

    tracing::info!("Shutdown signal received, draining scheduler");
    scheduler.stop().await;
    tracing::info!("Worker stopped");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
