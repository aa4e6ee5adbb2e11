//! Service and repository wiring

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use storeguard_core::Config;
use storeguard_db::{
    ArtifactStore, AuditSink, InMemoryArtifactStore, InMemorySecurityEventStore,
    PgArtifactStore, PgSecurityEventStore, SecurityEventStore,
};
use storeguard_inspect::RequestFilter;
use storeguard_processing::FileIntakePolicy;
use storeguard_storage::{LocalStorage, Storage};

use crate::state::{AppState, SecurityState, UploadState};

/// Build the application state on local storage and either Postgres or in-memory stores.
pub async fn initialize_services(config: &Config, pool: Option<PgPool>) -> Result<Arc<AppState>> {
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(config.storage_path())
            .await
            .context("Failed to initialize upload storage")?,
    );
    tracing::info!(path = %config.storage_path(), "Local storage initialized");

    let (events, artifacts): (Arc<dyn SecurityEventStore>, Arc<dyn ArtifactStore>) =
        match &pool {
            Some(pool) => (
                Arc::new(PgSecurityEventStore::new(pool.clone())),
                Arc::new(PgArtifactStore::new(pool.clone())),
            ),
            None => (
                Arc::new(InMemorySecurityEventStore::new()),
                Arc::new(InMemoryArtifactStore::new()),
            ),
        };

    Ok(build_state(config, pool, storage, events, artifacts))
}

/// Assemble the state from already constructed collaborators.
pub fn build_state(
    config: &Config,
    pool: Option<PgPool>,
    storage: Arc<dyn Storage>,
    events: Arc<dyn SecurityEventStore>,
    artifacts: Arc<dyn ArtifactStore>,
) -> Arc<AppState> {
    let intake = Arc::new(FileIntakePolicy::from_config(config, storage.clone()));

    tracing::info!(
        max_upload_bytes = config.max_upload_bytes(),
        unsafe_upload_action = ?config.unsafe_upload_action(),
        "File intake policy initialized"
    );

    Arc::new(AppState {
        config: config.clone(),
        pool,
        security: SecurityState {
            filter: RequestFilter::builtin(),
            audit: AuditSink::new(events),
            trusted_proxy_count: config.trusted_proxy_count(),
            max_form_body_bytes: config.max_form_body_bytes(),
        },
        uploads: UploadState {
            intake,
            artifacts,
            storage,
        },
    })
}
