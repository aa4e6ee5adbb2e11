//! Persistence for security events and uploaded artifact records
//!
//! Each store has a PostgreSQL implementation and an in-memory one used when no
//! database is configured (and by tests).

pub mod db;

pub use db::{
    AuditSink, ArtifactStore, InMemoryArtifactStore, InMemorySecurityEventStore,
    PgArtifactStore, PgSecurityEventStore, SecurityEventStore, SinkError,
};
