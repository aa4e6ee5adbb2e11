//! File intake policy
//!
//! `accept` runs, in order and stopping at the first failure:
//! presence → extension → size → (image: decode/strip/bound | other: content type)
//! → persist under the category namespace → signature scan → record.

use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use storeguard_core::{
    Actor, AppError, ArtifactCategory, Config, FileRejection, ScanVerdict, UnsafeUploadAction,
    UploadedArtifact,
};
use storeguard_storage::{artifact_key, generate_storage_name, Storage, StorageError};
use uuid::Uuid;

use crate::image::ImageSanitizer;
use crate::scan::{ContentScanner, SignatureScanner, SCAN_HEADER_LEN};
use crate::validator::{is_image_extension, sanitize_original_name, IntakeValidator};

/// An upload as received from the transport.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: Option<String>,
    pub declared_content_type: Option<String>,
    pub data: Bytes,
}

impl IncomingFile {
    pub fn new(
        filename: impl Into<String>,
        declared_content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: Some(filename.into()),
            declared_content_type,
            data: data.into(),
        }
    }

    pub fn byte_length(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Upload rejected: {0:?}")]
    Rejected(FileRejection),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl IntakeError {
    pub fn rejection(&self) -> Option<FileRejection> {
        match self {
            IntakeError::Rejected(reason) => Some(*reason),
            IntakeError::Storage(_) => None,
        }
    }
}

impl From<FileRejection> for IntakeError {
    fn from(reason: FileRejection) -> Self {
        IntakeError::Rejected(reason)
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Rejected(reason) => AppError::FileRejected(reason),
            IntakeError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}

/// Outcome of an accepted upload
#[derive(Debug, Clone)]
pub struct FileIntakeResult {
    pub artifact: UploadedArtifact,
    pub content_type: String,
    pub stored_size: u64,
    pub scan: ScanVerdict,
    pub resized: bool,
}

impl FileIntakeResult {
    pub fn is_safe(&self) -> bool {
        self.scan.is_safe()
    }
}

pub struct FileIntakePolicy {
    validator: IntakeValidator,
    images: ImageSanitizer,
    storage: Arc<dyn Storage>,
    scanner: Arc<dyn ContentScanner>,
    unsafe_action: UnsafeUploadAction,
}

impl FileIntakePolicy {
    pub fn new(
        validator: IntakeValidator,
        images: ImageSanitizer,
        storage: Arc<dyn Storage>,
        scanner: Arc<dyn ContentScanner>,
        unsafe_action: UnsafeUploadAction,
    ) -> Self {
        Self {
            validator,
            images,
            storage,
            scanner,
            unsafe_action,
        }
    }

    /// Build the policy from configuration with the built-in signature scanner.
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Self {
        let (max_width, max_height) = config.max_image_dimensions();
        Self::new(
            IntakeValidator::new(
                config.max_upload_bytes(),
                config.allowed_extensions().to_vec(),
                config.allowed_content_types().to_vec(),
            ),
            ImageSanitizer::new(max_width, max_height),
            storage,
            Arc::new(SignatureScanner::new(config.max_upload_bytes() as u64)),
            config.unsafe_upload_action(),
        )
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.validator.max_file_size()
    }

    #[tracing::instrument(
        skip(self, upload, owner),
        fields(owner_id = %owner.id, category = %category, size_bytes = upload.byte_length())
    )]
    pub async fn accept(
        &self,
        upload: IncomingFile,
        owner: &Actor,
        category: ArtifactCategory,
        product_id: Option<i64>,
    ) -> Result<FileIntakeResult, IntakeError> {
        let IncomingFile {
            filename,
            declared_content_type,
            data,
        } = upload;

        let filename = match filename {
            Some(name) if !data.is_empty() => name,
            _ => return Err(reject(FileRejection::NoFile, "empty or missing file")),
        };

        let extension = self.validator.validate_extension(&filename).map_err(|e| {
            reject(e.rejection(), &e.to_string())
        })?;

        self.validator
            .validate_file_size(data.len())
            .map_err(|e| reject(e.rejection(), &e.to_string()))?;

        let (content_type, bytes, resized) = if is_image_extension(&extension) {
            let sanitized = self
                .images
                .sanitize_blocking(data.to_vec())
                .await
                .map_err(|e| reject(FileRejection::CorruptImage, &e.to_string()))?;
            let resized = sanitized.was_resized();
            (sanitized.content_type().to_string(), sanitized.data, resized)
        } else {
            let content_type = self
                .validator
                .validate_content_type(declared_content_type.as_deref())
                .map_err(|e| reject(e.rejection(), &e.to_string()))?;
            (content_type, data.to_vec(), false)
        };

        let storage_name = generate_storage_name(&extension);
        let storage_key = artifact_key(&category, &storage_name);
        let stored_size = self.storage.put(&storage_key, &bytes).await.map_err(|e| {
            tracing::error!(error = %e, key = %storage_key, "Failed to persist upload");
            IntakeError::Storage(e)
        })?;

        let scan = self.scan_stored(&storage_key).await;
        if !scan.is_safe() {
            tracing::warn!(
                key = %storage_key,
                scanner = self.scanner.name(),
                verdict = %scan.summary(),
                action = ?self.unsafe_action,
                "Stored upload failed signature scan"
            );
            if self.unsafe_action == UnsafeUploadAction::Reject {
                if let Err(e) = self.storage.delete(&storage_key).await {
                    tracing::error!(error = %e, key = %storage_key, "Failed to remove unsafe upload");
                }
                return Err(IntakeError::Rejected(FileRejection::UnsafeContent));
            }
        }

        let artifact = UploadedArtifact {
            id: Uuid::new_v4(),
            original_name: sanitize_original_name(&filename),
            storage_name,
            storage_key,
            content_type: content_type.clone(),
            size_bytes: stored_size as i64,
            category,
            owner_id: owner.id.clone(),
            product_id,
            scanned: true,
            scan: scan.clone(),
            uploaded_at: Utc::now(),
        };

        tracing::info!(
            artifact_id = %artifact.id,
            key = %artifact.storage_key,
            content_type = %content_type,
            stored_size,
            resized,
            safe = scan.is_safe(),
            "Upload accepted"
        );

        Ok(FileIntakeResult {
            artifact,
            content_type,
            stored_size,
            scan,
            resized,
        })
    }

    /// Scan a stored object; any read failure counts as unsafe.
    async fn scan_stored(&self, storage_key: &str) -> ScanVerdict {
        let size = match self.storage.content_length(storage_key).await {
            Ok(size) => size,
            Err(e) => {
                tracing::error!(error = %e, key = %storage_key, "Scan could not stat stored file");
                return ScanVerdict::Unsafe("scan failed".to_string());
            }
        };
        match self.storage.read_header(storage_key, SCAN_HEADER_LEN).await {
            Ok(header) => self.scanner.scan(size, &header).await,
            Err(e) => {
                tracing::error!(error = %e, key = %storage_key, "Scan could not read stored file");
                ScanVerdict::Unsafe("scan failed".to_string())
            }
        }
    }
}

fn reject(reason: FileRejection, detail: &str) -> IntakeError {
    tracing::debug!(reason = reason.code(), detail = %detail, "Upload rejected");
    IntakeError::Rejected(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader, Rgb, RgbImage};
    use std::io::Cursor;
    use storeguard_core::GuardConfig;
    use storeguard_storage::LocalStorage;
    use tempfile::TempDir;

    async fn policy_with(action: UnsafeUploadAction) -> (FileIntakePolicy, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GuardConfig::with_defaults(dir.path().to_string_lossy().to_string());
        config.unsafe_upload_action = action;
        let config = Config(Box::new(config));
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (FileIntakePolicy::from_config(&config, Arc::new(storage)), dir)
    }

    async fn policy() -> (FileIntakePolicy, TempDir) {
        policy_with(UnsafeUploadAction::Flag).await
    }

    fn owner() -> Actor {
        Actor::new("user-1", Some("Ada".to_string()))
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 96])
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn text(len: usize) -> Vec<u8> {
        "lorem ipsum dolor sit amet "
            .repeat(len / 27 + 1)
            .into_bytes()
            .into_iter()
            .take(len)
            .collect()
    }

    #[tokio::test]
    async fn test_accepts_text_document() {
        let (policy, dir) = policy().await;
        let upload = IncomingFile::new("notes.TXT", Some("text/plain".to_string()), text(300));

        let result = policy
            .accept(upload, &owner(), ArtifactCategory::default(), Some(42))
            .await
            .unwrap();

        let artifact = &result.artifact;
        assert!(result.is_safe());
        assert_eq!(result.content_type, "text/plain");
        assert_eq!(result.stored_size, 300);
        assert_eq!(artifact.owner_id, "user-1");
        assert_eq!(artifact.product_id, Some(42));
        assert_eq!(artifact.original_name, "notes.TXT");
        assert!(artifact.storage_name.ends_with(".txt"));
        assert!(artifact.storage_key.starts_with("uploads/general/"));
        assert!(artifact.scanned);
        assert!(dir.path().join(&artifact.storage_key).exists());
    }

    #[tokio::test]
    async fn test_missing_or_empty_file_is_no_file() {
        let (policy, _dir) = policy().await;

        let empty = IncomingFile::new("a.txt", Some("text/plain".to_string()), Vec::new());
        let absent = IncomingFile {
            filename: None,
            declared_content_type: None,
            data: Bytes::from(text(200)),
        };

        for upload in [empty.clone(), empty, absent] {
            let err = policy
                .accept(upload, &owner(), ArtifactCategory::default(), None)
                .await
                .unwrap_err();
            assert_eq!(err.rejection(), Some(FileRejection::NoFile));
        }
    }

    #[tokio::test]
    async fn test_bad_extension() {
        let (policy, _dir) = policy().await;
        let upload = IncomingFile::new(
            "setup.exe",
            Some("application/x-msdownload".to_string()),
            text(300),
        );
        let err = policy
            .accept(upload, &owner(), ArtifactCategory::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(FileRejection::BadExtension));
    }

    #[tokio::test]
    async fn test_too_large() {
        let (policy, _dir) = policy().await;
        let upload = IncomingFile::new(
            "big.txt",
            Some("text/plain".to_string()),
            vec![b'a'; policy.max_upload_bytes() + 1],
        );
        let err = policy
            .accept(upload, &owner(), ArtifactCategory::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(FileRejection::TooLarge));
    }

    #[tokio::test]
    async fn test_renamed_executable_is_corrupt_image() {
        let (policy, dir) = policy().await;
        let mut exe = b"MZ\x90\x00\x03\x00\x00\x00\x04\x00".to_vec();
        exe.extend(std::iter::repeat(0u8).take(1024));
        let upload = IncomingFile::new("cat.jpg", Some("image/jpeg".to_string()), exe);

        let err = policy
            .accept(upload, &owner(), ArtifactCategory::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(FileRejection::CorruptImage));
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_disallowed_mime_type() {
        let (policy, _dir) = policy().await;

        for declared in [None, Some("application/octet-stream")] {
            let upload =
                IncomingFile::new("notes.txt", declared.map(str::to_string), text(300));
            let err = policy
                .accept(upload, &owner(), ArtifactCategory::default(), None)
                .await
                .unwrap_err();
            assert_eq!(err.rejection(), Some(FileRejection::DisallowedMimeType));
        }
    }

    #[tokio::test]
    async fn test_allowed_mime_type_is_not_tied_to_extension() {
        let (policy, _dir) = policy().await;
        let upload = IncomingFile::new(
            "notes.txt",
            Some("application/pdf".to_string()),
            text(300),
        );

        let result = policy
            .accept(upload, &owner(), ArtifactCategory::default(), None)
            .await
            .unwrap();
        assert_eq!(result.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_image_type_comes_from_decoded_content() {
        let (policy, dir) = policy().await;
        let upload = IncomingFile::new("photo.jpg", Some("image/jpeg".to_string()), png(40, 30));

        let result = policy
            .accept(upload, &owner(), ArtifactCategory::default(), None)
            .await
            .unwrap();
        assert_eq!(result.content_type, "image/png");
        assert!(dir.path().join(&result.artifact.storage_key).exists());
    }

    #[tokio::test]
    async fn test_oversized_image_is_stored_within_bound() {
        let (policy, dir) = policy().await;
        let upload = IncomingFile::new("wide.png", None, png(2400, 1350));

        let result = policy
            .accept(
                upload,
                &owner(),
                ArtifactCategory::parse("products").unwrap(),
                None,
            )
            .await
            .unwrap();

        assert!(result.resized);
        assert_eq!(result.content_type, "image/png");
        assert!(result.artifact.storage_key.starts_with("uploads/products/"));

        let stored = std::fs::read(dir.path().join(&result.artifact.storage_key)).unwrap();
        let (width, height) = ImageReader::new(Cursor::new(&stored))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
            .dimensions();
        assert!(width <= 1920 && height <= 1080);
        assert_eq!((width, height), (1920, 1080));
    }

    #[tokio::test]
    async fn test_unsafe_upload_is_flagged() {
        let (policy, dir) = policy().await;
        let mut script = b"#!/bin/sh\n".to_vec();
        script.extend(text(300));
        let upload = IncomingFile::new("readme.txt", Some("text/plain".to_string()), script);

        let result = policy
            .accept(upload, &owner(), ArtifactCategory::default(), None)
            .await
            .unwrap();

        assert!(!result.is_safe());
        assert!(!result.artifact.is_safe());
        assert!(dir.path().join(&result.artifact.storage_key).exists());
    }

    #[tokio::test]
    async fn test_unsafe_upload_is_rejected_when_configured() {
        let (policy, dir) = policy_with(UnsafeUploadAction::Reject).await;
        let mut page = b"<?php echo 1; ?>".to_vec();
        page.extend(text(300));
        let upload = IncomingFile::new("page.txt", Some("text/plain".to_string()), page);

        let err = policy
            .accept(upload, &owner(), ArtifactCategory::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(FileRejection::UnsafeContent));

        let namespace = dir.path().join("uploads/general");
        let remaining = std::fs::read_dir(&namespace).map(|d| d.count()).unwrap_or(0);
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_storage_names_do_not_collide() {
        let (policy, _dir) = policy().await;
        let mut keys = std::collections::HashSet::new();
        for _ in 0..5 {
            let upload = IncomingFile::new("same.txt", Some("text/plain".to_string()), text(200));
            let result = policy
                .accept(upload, &owner(), ArtifactCategory::default(), None)
                .await
                .unwrap();
            assert!(keys.insert(result.artifact.storage_key));
        }
    }

    #[test]
    fn test_intake_error_maps_to_app_error() {
        let err: AppError = IntakeError::Rejected(FileRejection::TooLarge).into();
        assert!(matches!(err, AppError::FileRejected(FileRejection::TooLarge)));

        let err: AppError =
            IntakeError::Storage(StorageError::UploadFailed("disk full".to_string())).into();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
