use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use storeguard_core::{SecurityEvent, SecurityEventKind, Severity};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Security event store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Security event store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only store of security events.
///
/// Queries return newest first.
#[async_trait::async_trait]
pub trait SecurityEventStore: Send + Sync {
    async fn record(&self, event: &SecurityEvent) -> Result<(), SinkError>;

    /// At most `limit` events, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, SinkError>;

    /// Every event whose actor id equals `actor_id`, newest first.
    async fn for_actor(&self, actor_id: &str) -> Result<Vec<SecurityEvent>, SinkError>;
}

#[derive(sqlx::FromRow)]
struct SecurityEventRow {
    id: Uuid,
    kind: String,
    actor_id: String,
    actor_name: String,
    detail: String,
    origin: String,
    severity: String,
    success: bool,
    occurred_at: DateTime<Utc>,
}

impl From<SecurityEventRow> for SecurityEvent {
    fn from(row: SecurityEventRow) -> Self {
        SecurityEvent {
            id: row.id,
            kind: SecurityEventKind::from(row.kind),
            actor_id: row.actor_id,
            actor_name: row.actor_name,
            detail: row.detail,
            origin: row.origin,
            severity: Severity::parse(&row.severity),
            success: row.success,
            occurred_at: row.occurred_at,
        }
    }
}

#[derive(Clone)]
pub struct PgSecurityEventStore {
    pool: PgPool,
}

impl PgSecurityEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SecurityEventStore for PgSecurityEventStore {
    #[tracing::instrument(skip(self, event), fields(
        db.system = "postgresql",
        db.table = "security_events",
        db.operation = "insert",
        event.kind = %event.kind
    ))]
    async fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        sqlx::query(
            r#"
            INSERT INTO security_events (
                id, kind, actor_id, actor_name, detail, origin, severity, success, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id)
        .bind(event.kind.as_str())
        .bind(&event.actor_id)
        .bind(&event.actor_name)
        .bind(&event.detail)
        .bind(&event.origin)
        .bind(event.severity.as_str())
        .bind(event.success)
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "security_events", db.operation = "select"))]
    async fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, SinkError> {
        let rows = sqlx::query_as::<Postgres, SecurityEventRow>(
            r#"
            SELECT id, kind, actor_id, actor_name, detail, origin, severity, success, occurred_at
            FROM security_events
            ORDER BY occurred_at DESC, seq DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SecurityEvent::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "security_events", db.operation = "select"))]
    async fn for_actor(&self, actor_id: &str) -> Result<Vec<SecurityEvent>, SinkError> {
        let rows = sqlx::query_as::<Postgres, SecurityEventRow>(
            r#"
            SELECT id, kind, actor_id, actor_name, detail, origin, severity, success, occurred_at
            FROM security_events
            WHERE actor_id = $1
            ORDER BY occurred_at DESC, seq DESC
            "#,
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SecurityEvent::from).collect())
    }
}

/// Process-local event store used when no database is configured.
///
/// Meant for development and tests: events live only as long as the process. The log
/// is kept ordered by timestamp on insert so reads walk it backwards without sorting.
#[derive(Default)]
pub struct InMemorySecurityEventStore {
    events: RwLock<Vec<SecurityEvent>>,
}

impl InMemorySecurityEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SecurityEventStore for InMemorySecurityEventStore {
    async fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        let mut events = self.events.write().await;
        // Ties land after existing events so the later insertion reads first.
        let position = events.partition_point(|e| e.occurred_at <= event.occurred_at);
        events.insert(position, event.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<SecurityEvent>, SinkError> {
        let events = self.events.read().await;
        Ok(events.iter().rev().take(limit).cloned().collect())
    }

    async fn for_actor(&self, actor_id: &str) -> Result<Vec<SecurityEvent>, SinkError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .rev()
            .filter(|event| event.actor_id == actor_id)
            .cloned()
            .collect())
    }
}
