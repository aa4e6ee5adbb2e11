//! Best-effort audit sink
//!
//! Every event is first written to the `audit` tracing target, then handed to the
//! durable store. A failed store write is logged and swallowed: auditing never
//! changes the outcome of the action it describes.

use std::sync::Arc;
use storeguard_core::{SecurityEvent, Severity};

use super::security_event::{SecurityEventStore, SinkError};

#[derive(Clone)]
pub struct AuditSink {
    store: Arc<dyn SecurityEventStore>,
}

impl AuditSink {
    pub fn new(store: Arc<dyn SecurityEventStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SecurityEventStore> {
        &self.store
    }

    /// Log and persist `event`.
    pub async fn record(&self, event: SecurityEvent) {
        emit(&event);

        if let Err(e) = self.store.record(&event).await {
            tracing::error!(
                error = %e,
                event_id = %event.id,
                kind = %event.kind,
                actor_id = %event.actor_id,
                "Failed to persist security event"
            );
        }
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, SinkError> {
        self.store.recent(limit).await
    }

    pub async fn for_actor(&self, actor_id: &str) -> Result<Vec<SecurityEvent>, SinkError> {
        self.store.for_actor(actor_id).await
    }
}

fn emit(event: &SecurityEvent) {
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());

    match event.severity {
        Severity::Critical => tracing::event!(
            target: "audit",
            tracing::Level::ERROR,
            audit_entry = %json,
            kind = %event.kind,
            actor_id = %event.actor_id,
            origin = %event.origin,
            success = event.success,
            "Security audit log - critical"
        ),
        Severity::Warning => tracing::event!(
            target: "audit",
            tracing::Level::WARN,
            audit_entry = %json,
            kind = %event.kind,
            actor_id = %event.actor_id,
            origin = %event.origin,
            success = event.success,
            "Security audit log - warning"
        ),
        Severity::Info if !event.success => tracing::event!(
            target: "audit",
            tracing::Level::WARN,
            audit_entry = %json,
            kind = %event.kind,
            actor_id = %event.actor_id,
            origin = %event.origin,
            success = event.success,
            "Security audit log - failure"
        ),
        Severity::Info => tracing::event!(
            target: "audit",
            tracing::Level::INFO,
            audit_entry = %json,
            kind = %event.kind,
            actor_id = %event.actor_id,
            origin = %event.origin,
            success = event.success,
            "Security audit log"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemorySecurityEventStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storeguard_core::SecurityEventKind;

    struct UnavailableStore {
        attempts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SecurityEventStore for UnavailableStore {
        async fn record(&self, _event: &SecurityEvent) -> Result<(), SinkError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SinkError::Unavailable("connection refused".to_string()))
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<SecurityEvent>, SinkError> {
            Err(SinkError::Unavailable("connection refused".to_string()))
        }

        async fn for_actor(&self, _actor_id: &str) -> Result<Vec<SecurityEvent>, SinkError> {
            Err(SinkError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_record_persists_event() {
        let store = Arc::new(InMemorySecurityEventStore::new());
        let sink = AuditSink::new(store.clone());

        sink.record(
            SecurityEvent::new(SecurityEventKind::RequestBlocked).with_severity(Severity::Warning),
        )
        .await;

        let recent = sink.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].kind, SecurityEventKind::RequestBlocked);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = Arc::new(UnavailableStore {
            attempts: AtomicUsize::new(0),
        });
        let sink = AuditSink::new(store.clone());

        for severity in [Severity::Info, Severity::Warning, Severity::Critical] {
            sink.record(SecurityEvent::new(SecurityEventKind::FileDelete).with_severity(severity))
                .await;
        }

        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
        assert!(sink.recent(10).await.is_err());
    }
}
