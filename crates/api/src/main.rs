use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use applicant_tracking_api::app::{create_app, AppState, Collaborators};
use applicant_tracking_api::config::Config;
use applicant_tracking_api::jobs::{ExpireInvitationsJob, JobScheduler};
use applicant_tracking_api::middleware::{init_metrics, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    init_logging(&config.logging).context("failed to initialize logging")?;
    init_metrics().context("failed to install Prometheus recorder")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting applicant tracking API");

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations");
    persistence::db::run_migrations(&pool).await?;

    let deps = Collaborators::from_config(&config, &pool).await;
    let state = AppState::new(config.clone(), pool.clone(), deps)?;

    let mut scheduler = JobScheduler::new();
    if config.jobs.enabled {
        scheduler.register(ExpireInvitationsJob::new(
            Arc::clone(&state.guarantors),
            config.jobs.invitation_sweep_minutes,
        ));
        info!(jobs = ?scheduler.job_names(), "Background jobs registered");
        scheduler.start();
    }

    let app = create_app(state);
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
