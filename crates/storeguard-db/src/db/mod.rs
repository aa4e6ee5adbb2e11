//! Repositories
//
// Security event store and the best-effort audit sink on top of it
pub mod audit;
pub mod security_event;
//
// Uploaded artifact records
pub mod artifact;

pub use artifact::{ArtifactStore, InMemoryArtifactStore, PgArtifactStore};
pub use audit::AuditSink;
pub use security_event::{
    InMemorySecurityEventStore, PgSecurityEventStore, SecurityEventStore, SinkError,
};
