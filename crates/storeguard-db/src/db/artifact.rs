use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use storeguard_core::{AppError, ArtifactCategory, ScanVerdict, UploadedArtifact};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persistence for uploaded artifact records
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn insert(&self, artifact: &UploadedArtifact) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<UploadedArtifact>, AppError>;

    /// Remove a record; returns whether it existed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Records owned by `owner_id`, newest first.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<UploadedArtifact>, AppError>;
}

#[derive(sqlx::FromRow)]
struct ArtifactRow {
    id: Uuid,
    original_name: String,
    storage_name: String,
    storage_key: String,
    content_type: String,
    size_bytes: i64,
    category: String,
    owner_id: String,
    product_id: Option<i64>,
    scanned: bool,
    is_safe: bool,
    scan_result: String,
    uploaded_at: DateTime<Utc>,
}

impl From<ArtifactRow> for UploadedArtifact {
    fn from(row: ArtifactRow) -> Self {
        UploadedArtifact {
            id: row.id,
            original_name: row.original_name,
            storage_name: row.storage_name,
            storage_key: row.storage_key,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            category: ArtifactCategory::parse(&row.category).unwrap_or_default(),
            owner_id: row.owner_id,
            product_id: row.product_id,
            scanned: row.scanned,
            scan: ScanVerdict::from_parts(row.is_safe, &row.scan_result),
            uploaded_at: row.uploaded_at,
        }
    }
}

const ARTIFACT_COLUMNS: &str = "id, original_name, storage_name, storage_key, content_type, \
     size_bytes, category, owner_id, product_id, scanned, is_safe, scan_result, uploaded_at";

#[derive(Clone)]
pub struct PgArtifactStore {
    pool: PgPool,
}

impl PgArtifactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ArtifactStore for PgArtifactStore {
    #[tracing::instrument(skip(self, artifact), fields(
        db.table = "uploaded_artifacts",
        db.operation = "insert",
        db.record_id = %artifact.id
    ))]
    async fn insert(&self, artifact: &UploadedArtifact) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO uploaded_artifacts (
                id, original_name, storage_name, storage_key, content_type, size_bytes,
                category, owner_id, product_id, scanned, is_safe, scan_result, uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(artifact.id)
        .bind(&artifact.original_name)
        .bind(&artifact.storage_name)
        .bind(&artifact.storage_key)
        .bind(&artifact.content_type)
        .bind(artifact.size_bytes)
        .bind(artifact.category.as_str())
        .bind(&artifact.owner_id)
        .bind(artifact.product_id)
        .bind(artifact.scanned)
        .bind(artifact.is_safe())
        .bind(artifact.scan.summary())
        .bind(artifact.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_artifacts", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<UploadedArtifact>, AppError> {
        let row = sqlx::query_as::<Postgres, ArtifactRow>(&format!(
            "SELECT {} FROM uploaded_artifacts WHERE id = $1",
            ARTIFACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UploadedArtifact::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_artifacts", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM uploaded_artifacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "uploaded_artifacts", db.operation = "select"))]
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<UploadedArtifact>, AppError> {
        let rows = sqlx::query_as::<Postgres, ArtifactRow>(&format!(
            "SELECT {} FROM uploaded_artifacts WHERE owner_id = $1 ORDER BY uploaded_at DESC",
            ARTIFACT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UploadedArtifact::from).collect())
    }
}

#[derive(Default)]
pub struct InMemoryArtifactStore {
    records: RwLock<HashMap<Uuid, UploadedArtifact>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn insert(&self, artifact: &UploadedArtifact) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records
            .values()
            .any(|existing| existing.storage_key == artifact.storage_key)
        {
            return Err(AppError::InvalidInput(format!(
                "Storage key already recorded: {}",
                artifact.storage_key
            )));
        }
        records.insert(artifact.id, artifact.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<UploadedArtifact>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<UploadedArtifact>, AppError> {
        let mut owned: Vec<UploadedArtifact> = self
            .records
            .read()
            .await
            .values()
            .filter(|artifact| artifact.is_owned_by(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(owned)
    }
}
