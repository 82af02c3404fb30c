//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub integrations: IntegrationsHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Whether the outbound integrations are switched on. Reachability is not
/// probed.
#[derive(Debug, Serialize)]
pub struct IntegrationsHealth {
    pub email_provider: Option<String>,
    pub object_storage: bool,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

async fn ping_database(state: &AppState) -> Option<u64> {
    let start = std::time::Instant::now();
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .ok()
        .map(|_| start.elapsed().as_millis() as u64)
}

/// `GET /api/health`: 200 with details while the database answers, else 503.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let latency_ms = ping_database(&state).await;
    let connected = latency_ms.is_some();
    persistence::metrics::record_pool_metrics(&state.pool);

    let email = &state.config.email;
    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            connected,
            latency_ms,
        },
        integrations: IntegrationsHealth {
            email_provider: email.enabled.then(|| email.provider.clone()),
            object_storage: state.config.storage.enabled,
        },
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness probe: the process is up.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe: the database is reachable.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    match ping_database(&state).await {
        Some(_) => Ok(Json(StatusResponse {
            status: "ready".to_string(),
        })),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
