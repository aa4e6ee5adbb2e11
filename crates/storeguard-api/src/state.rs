//! Application state
//!
//! Split into sub-states so setup and handlers only touch what they need.

use sqlx::PgPool;
use std::sync::Arc;
use storeguard_core::Config;
use storeguard_db::{ArtifactStore, AuditSink};
use storeguard_inspect::RequestFilter;
use storeguard_processing::FileIntakePolicy;
use storeguard_storage::Storage;

/// Request inspection and audit
#[derive(Clone)]
pub struct SecurityState {
    pub filter: RequestFilter<'static>,
    pub audit: AuditSink,
    pub trusted_proxy_count: usize,
    pub max_form_body_bytes: usize,
}

/// Upload intake, artifact records and the bytes behind them
#[derive(Clone)]
pub struct UploadState {
    pub intake: Arc<FileIntakePolicy>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub storage: Arc<dyn Storage>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when running on in-memory stores
    pub pool: Option<PgPool>,
    pub security: SecurityState,
    pub uploads: UploadState,
}
