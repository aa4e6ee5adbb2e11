//! Test helpers: build the router on in-memory stores and a temp-dir storage root.
//!
//! Run from workspace root: `cargo test -p storeguard-api`.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use axum_test::TestServer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use storeguard_api::constants;
use storeguard_api::setup::{routes, services};
use storeguard_core::{Config, GuardConfig, SecurityEvent, SecurityEventKind, UnsafeUploadAction};
use storeguard_db::{
    InMemoryArtifactStore, InMemorySecurityEventStore, SecurityEventStore, SinkError,
};
use storeguard_storage::{LocalStorage, Storage};
use tempfile::TempDir;

pub const OWNER_ID: &str = "user-1";
pub const OTHER_ID: &str = "user-2";
pub const ADMIN_ID: &str = "admin-1";

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, inspectable stores and the storage root.
pub struct TestApp {
    pub server: TestServer,
    pub events: Arc<InMemorySecurityEventStore>,
    pub artifacts: Arc<InMemoryArtifactStore>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn events_of_kind(&self, kind: SecurityEventKind) -> Vec<SecurityEvent> {
        self.events
            .recent(1_000)
            .await
            .expect("in-memory store never fails")
            .into_iter()
            .filter(|event| event.kind == kind)
            .collect()
    }
}

fn test_config(temp_dir: &TempDir, unsafe_action: UnsafeUploadAction) -> Config {
    let mut config = GuardConfig::with_defaults(temp_dir.path().to_string_lossy().to_string());
    config.unsafe_upload_action = unsafe_action;
    Config(Box::new(config))
}

async fn build_app(
    unsafe_action: UnsafeUploadAction,
    sink: Option<Arc<dyn SecurityEventStore>>,
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(&temp_dir, unsafe_action);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path())
            .await
            .expect("local storage"),
    );
    let events = Arc::new(InMemorySecurityEventStore::new());
    let artifacts = Arc::new(InMemoryArtifactStore::new());
    let sink: Arc<dyn SecurityEventStore> = match sink {
        Some(sink) => sink,
        None => events.clone(),
    };

    let state = services::build_state(&config, None, storage, sink, artifacts.clone());
    let router = routes::setup_routes(&config, state);

    TestApp {
        server: TestServer::new(router).expect("test server"),
        events,
        artifacts,
        _temp_dir: temp_dir,
    }
}

/// App with default configuration (unsafe uploads are flagged).
pub async fn setup_test_app() -> TestApp {
    build_app(UnsafeUploadAction::Flag, None).await
}

/// App that deletes uploads failing the signature scan.
pub async fn setup_rejecting_app() -> TestApp {
    build_app(UnsafeUploadAction::Reject, None).await
}

/// App whose audit store is down.
pub async fn setup_app_with_failing_sink() -> (TestApp, Arc<FailingEventStore>) {
    let failing = Arc::new(FailingEventStore::default());
    let app = build_app(
        UnsafeUploadAction::Flag,
        Some(failing.clone() as Arc<dyn SecurityEventStore>),
    )
    .await;
    (app, failing)
}

/// Security event store simulating an outage.
#[derive(Default)]
pub struct FailingEventStore {
    attempts: AtomicUsize,
}

impl FailingEventStore {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecurityEventStore for FailingEventStore {
    async fn record(&self, _event: &SecurityEvent) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Unavailable("audit database offline".to_string()))
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<SecurityEvent>, SinkError> {
        Err(SinkError::Unavailable("audit database offline".to_string()))
    }

    async fn for_actor(&self, _actor_id: &str) -> Result<Vec<SecurityEvent>, SinkError> {
        Err(SinkError::Unavailable("audit database offline".to_string()))
    }
}
