//! Upload lifecycle orchestration
//!
//! Ties the intake policy, the artifact store, storage and the audit sink together.
//! Audit writes are best-effort; they never change the result returned here.

use storeguard_core::{
    Actor, AppError, ArtifactCategory, SecurityEvent, SecurityEventKind, Severity,
    UploadedArtifact,
};
use storeguard_inspect::{FieldSource, Verdict};
use storeguard_processing::IntakeError;
use storeguard_storage::ByteStream;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::multipart::UploadForm;

/// Same answer for a missing artifact and one owned by someone else.
const NOT_FOUND_MESSAGE: &str = "Resource not found";

pub struct UploadService<'a> {
    state: &'a AppState,
}

impl<'a> UploadService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn event(&self, kind: SecurityEventKind, actor: &Actor, origin: &str) -> SecurityEvent {
        SecurityEvent::new(kind).with_actor(actor).with_origin(origin)
    }

    async fn audit(&self, event: SecurityEvent) {
        self.state.security.audit.record(event).await;
    }

    #[tracing::instrument(skip(self, actor, form), fields(actor_id = %actor.id))]
    pub async fn upload(
        &self,
        actor: &Actor,
        origin: &str,
        form: UploadForm,
    ) -> Result<UploadedArtifact, AppError> {
        if let Verdict::Rejected(finding) = self
            .state
            .security
            .filter
            .filter(
                FieldSource::Multipart,
                form.text_fields
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            )
        {
            tracing::warn!(
                target: "security",
                field = %finding.field,
                category = %finding.category,
                rule = %finding.rule,
                value = %finding.value,
                origin = %origin,
                "Upload form field blocked by input filter"
            );
            self.audit(
                self.event(SecurityEventKind::RequestBlocked, actor, origin)
                    .with_detail(finding.summary())
                    .with_severity(Severity::Warning)
                    .failed(),
            )
            .await;
            return Err(finding.to_error());
        }

        let category = ArtifactCategory::parse(form.text("category").unwrap_or_default())?;
        let product_id = form
            .text("product_id")
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<i64>().map_err(|_| {
                    AppError::InvalidInput("product_id must be an integer".to_string())
                })
            })
            .transpose()?;

        let filename = form.file.filename.clone().unwrap_or_default();
        let accepted = match self
            .state
            .uploads
            .intake
            .accept(form.file, actor, category, product_id)
            .await
        {
            Ok(accepted) => accepted,
            Err(IntakeError::Rejected(reason)) => {
                self.audit(
                    self.event(SecurityEventKind::FileUploadRejected, actor, origin)
                        .with_detail(format!(
                            "Upload of '{}' rejected: {}",
                            filename,
                            reason.code()
                        ))
                        .with_severity(Severity::Warning)
                        .failed(),
                )
                .await;
                return Err(AppError::FileRejected(reason));
            }
            Err(e) => return Err(e.into()),
        };

        let artifact = accepted.artifact;
        if let Err(e) = self.state.uploads.artifacts.insert(&artifact).await {
            tracing::error!(
                error = %e,
                artifact_id = %artifact.id,
                "Failed to record upload, removing stored object"
            );
            if let Err(cleanup) = self
                .state
                .uploads
                .storage
                .delete(&artifact.storage_key)
                .await
            {
                tracing::error!(
                    error = %cleanup,
                    key = %artifact.storage_key,
                    "Failed to remove orphaned upload"
                );
            }
            return Err(AppError::Storage(format!("Failed to record upload: {}", e)));
        }

        let severity = if artifact.is_safe() {
            Severity::Info
        } else {
            Severity::Warning
        };
        self.audit(
            self.event(SecurityEventKind::FileUpload, actor, origin)
                .with_detail(format!(
                    "Uploaded '{}' ({} bytes, {}) as {}; scan: {}",
                    artifact.original_name,
                    artifact.size_bytes,
                    artifact.category,
                    artifact.id,
                    artifact.scan.summary()
                ))
                .with_severity(severity),
        )
        .await;

        Ok(artifact)
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<UploadedArtifact>, AppError> {
        self.state.uploads.artifacts.list_for_owner(&actor.id).await
    }

    /// Fetch an artifact the actor owns. Foreign artifacts look exactly like missing ones.
    async fn owned(
        &self,
        actor: &Actor,
        origin: &str,
        id: Uuid,
        action: &str,
    ) -> Result<UploadedArtifact, AppError> {
        let artifact = self
            .state
            .uploads
            .artifacts
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;

        if !artifact.is_owned_by(&actor.id) {
            self.audit(
                self.event(SecurityEventKind::UnauthorizedAccess, actor, origin)
                    .with_detail(format!(
                        "Attempted {} of artifact {} owned by another actor",
                        action, id
                    ))
                    .with_severity(Severity::Warning)
                    .failed(),
            )
            .await;
            return Err(AppError::NotFound(NOT_FOUND_MESSAGE.to_string()));
        }

        Ok(artifact)
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn download(
        &self,
        actor: &Actor,
        origin: &str,
        id: Uuid,
    ) -> Result<(UploadedArtifact, ByteStream), AppError> {
        let artifact = self.owned(actor, origin, id, "download").await?;

        if !artifact.is_safe() {
            self.audit(
                self.event(SecurityEventKind::FileDownload, actor, origin)
                    .with_detail(format!(
                        "Download of {} refused: {}",
                        id,
                        artifact.scan.summary()
                    ))
                    .with_severity(Severity::Warning)
                    .failed(),
            )
            .await;
            return Err(AppError::Forbidden(
                "File failed the safety scan and cannot be downloaded".to_string(),
            ));
        }

        let stream = self
            .state
            .uploads
            .storage
            .download_stream(&artifact.storage_key)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %artifact.storage_key, "Failed to open stored file");
                AppError::Storage(e.to_string())
            })?;

        self.audit(
            self.event(SecurityEventKind::FileDownload, actor, origin)
                .with_detail(format!("Downloaded '{}' ({})", artifact.original_name, id)),
        )
        .await;

        Ok((artifact, stream))
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn delete(&self, actor: &Actor, origin: &str, id: Uuid) -> Result<(), AppError> {
        let artifact = self.owned(actor, origin, id, "delete").await?;

        self.state
            .uploads
            .storage
            .delete(&artifact.storage_key)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %artifact.storage_key, "Failed to delete stored file");
                AppError::Storage(e.to_string())
            })?;
        self.state.uploads.artifacts.delete(id).await?;

        self.audit(
            self.event(SecurityEventKind::FileDelete, actor, origin)
                .with_detail(format!("Deleted '{}' ({})", artifact.original_name, id))
                .with_severity(Severity::Warning),
        )
        .await;

        Ok(())
    }
}
