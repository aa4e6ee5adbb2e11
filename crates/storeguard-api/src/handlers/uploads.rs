//! Artifact upload, listing, download and deletion

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use storeguard_core::{AppError, UploadedArtifact};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthenticatedActor;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::UploadService;
use crate::state::AppState;
use crate::utils::ip_extraction::ClientOrigin;
use crate::utils::multipart::extract_upload_form;

/// Client view of an artifact; storage paths are never exposed.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArtifactResponse {
    pub id: Uuid,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub category: String,
    pub product_id: Option<i64>,
    pub is_safe: bool,
    pub scan_result: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<UploadedArtifact> for ArtifactResponse {
    fn from(artifact: UploadedArtifact) -> Self {
        Self {
            id: artifact.id,
            is_safe: artifact.is_safe(),
            scan_result: artifact.scan.summary(),
            original_name: artifact.original_name,
            content_type: artifact.content_type,
            size_bytes: artifact.size_bytes,
            category: artifact.category.to_string(),
            product_id: artifact.product_id,
            uploaded_at: artifact.uploaded_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/uploads",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File accepted", body = ArtifactResponse),
        (status = 400, description = "File or form rejected", body = ErrorResponse),
        (status = 401, description = "Missing user identity", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    )
)]
pub async fn upload_artifact(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ClientOrigin(origin): ClientOrigin,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = extract_upload_form(multipart).await?;
    let artifact = UploadService::new(&state)
        .upload(&actor, &origin, form)
        .await?;

    Ok((StatusCode::CREATED, Json(ArtifactResponse::from(artifact))))
}

#[utoipa::path(
    get,
    path = "/api/v1/uploads",
    tag = "uploads",
    responses(
        (status = 200, description = "Artifacts owned by the caller", body = [ArtifactResponse]),
        (status = 401, description = "Missing user identity", body = ErrorResponse)
    )
)]
pub async fn list_artifacts(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> Result<Json<Vec<ArtifactResponse>>, HttpAppError> {
    let artifacts = UploadService::new(&state).list(&actor).await?;
    Ok(Json(
        artifacts.into_iter().map(ArtifactResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/uploads/{id}/file",
    tag = "uploads",
    params(("id" = Uuid, Path, description = "Artifact ID")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 403, description = "File failed the safety scan", body = ErrorResponse),
        (status = 404, description = "Artifact not found", body = ErrorResponse)
    )
)]
pub async fn download_artifact(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ClientOrigin(origin): ClientOrigin,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpAppError> {
    let (artifact, stream) = UploadService::new(&state)
        .download(&actor, &origin, id)
        .await?;

    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &artifact.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&artifact.original_name),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build download response");
            AppError::Internal(e.to_string()).into()
        })
}

#[utoipa::path(
    delete,
    path = "/api/v1/uploads/{id}",
    tag = "uploads",
    params(("id" = Uuid, Path, description = "Artifact ID")),
    responses(
        (status = 204, description = "Artifact deleted"),
        (status = 404, description = "Artifact not found", body = ErrorResponse)
    )
)]
pub async fn delete_artifact(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ClientOrigin(origin): ClientOrigin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    UploadService::new(&state)
        .delete(&actor, &origin, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Always `attachment`, with an ASCII fallback name and the exact name percent-encoded.
fn content_disposition(original_name: &str) -> String {
    let fallback: String = original_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(original_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_is_attachment() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
    }

    #[test]
    fn test_content_disposition_encodes_non_ascii() {
        let value = content_disposition("café.txt");
        assert!(value.starts_with("attachment; filename=\"caf_.txt\""));
        assert!(value.ends_with("filename*=UTF-8''caf%C3%A9.txt"));
    }
}
