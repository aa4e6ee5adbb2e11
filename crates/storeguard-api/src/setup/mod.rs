//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::constants::SERVICE_NAME;
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use storeguard_core::Config;
use storeguard_infra::{init_telemetry, LogFormat};

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    init_telemetry(SERVICE_NAME, config.environment(), LogFormat::from_env())
        .context("Failed to initialize telemetry")?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    let state = services::initialize_services(&config, pool).await?;

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
