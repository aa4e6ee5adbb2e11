//! Health check

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Object probed to prove the storage root is readable
const STORAGE_PROBE_KEY: &str = "health/probe";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
}

/// Returns "healthy", "timeout" or "{prefix}: {error}".
async fn run_check<F, E>(f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(CHECK_TIMEOUT, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthCheckResponse),
        (status = 503, description = "A dependency is unavailable", body = HealthCheckResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match &state.pool {
        Some(pool) => {
            run_check(
                async {
                    sqlx::query("SELECT 1")
                        .execute(pool)
                        .await
                        .map(|_| ())
                },
                "unhealthy",
            )
            .await
        }
        None => "in-memory".to_string(),
    };

    let storage = run_check(
        async {
            state
                .uploads
                .storage
                .exists(STORAGE_PROBE_KEY)
                .await
                .map(|_| ())
        },
        "unhealthy",
    )
    .await;

    let healthy = matches!(database.as_str(), "healthy" | "in-memory") && storage == "healthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        tracing::warn!(database = %database, storage = %storage, "Health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            database,
            storage,
        }),
    )
}
