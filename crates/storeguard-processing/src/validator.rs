use std::path::Path;
use storeguard_core::FileRejection;

/// Extensions handled as images (decoded, stripped and bounded before storage).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

const MAX_ORIGINAL_NAME_LEN: usize = 255;

/// Validation errors for uploaded files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty file")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Missing content type")]
    MissingContentType,

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

impl ValidationError {
    /// Client-facing rejection reason for this error
    pub fn rejection(&self) -> FileRejection {
        match self {
            ValidationError::EmptyFile => FileRejection::NoFile,
            ValidationError::FileTooLarge { .. } => FileRejection::TooLarge,
            ValidationError::InvalidExtension { .. } => FileRejection::BadExtension,
            ValidationError::MissingContentType | ValidationError::InvalidContentType { .. } => {
                FileRejection::DisallowedMimeType
            }
        }
    }
}

/// Normalize MIME type by stripping parameters (e.g. "text/plain; charset=utf-8" -> "text/plain").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

/// Lowercased extension of `filename`, without the dot.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty())
}

pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension)
}

/// Display-safe version of the uploader's file name.
///
/// Directory parts are dropped and anything but alphanumerics, `.`, `-` and `_`
/// becomes `_`. Never used to build a storage path.
pub fn sanitize_original_name(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = base
        .chars()
        .take(MAX_ORIGINAL_NAME_LEN)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['.', '_']).is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Extension, size and content-type checks for uploaded files.
#[derive(Debug, Clone)]
pub struct IntakeValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl IntakeValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|c| normalize_mime_type(&c))
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size; zero bytes counts as no file at all
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate the extension and return it lowercased
    pub fn validate_extension(&self, filename: &str) -> Result<String, ValidationError> {
        let extension = file_extension(filename).ok_or_else(|| {
            ValidationError::InvalidExtension {
                extension: String::new(),
                allowed: self.allowed_extensions.clone(),
            }
        })?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }

    /// Validate a declared content type and return it normalized
    pub fn validate_content_type(
        &self,
        content_type: Option<&str>,
    ) -> Result<String, ValidationError> {
        let normalized = content_type
            .map(normalize_mime_type)
            .filter(|ct| !ct.is_empty())
            .ok_or(ValidationError::MissingContentType)?;

        if !self.allowed_content_types.contains(&normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: normalized,
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_validator() -> IntakeValidator {
        IntakeValidator::new(
            10 * 1024 * 1024,
            vec!["jpg".into(), "jpeg".into(), "png".into(), "pdf".into(), ".TXT".into()],
            vec![
                "image/jpeg".into(),
                "image/png".into(),
                "application/pdf".into(),
                "text/plain".into(),
            ],
        )
    }

    #[test]
    fn test_validate_file_size() {
        let validator = create_validator();

        assert!(validator.validate_file_size(1024).is_ok());
        assert!(validator.validate_file_size(10 * 1024 * 1024).is_ok());
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
        assert!(matches!(
            validator.validate_file_size(10 * 1024 * 1024 + 1),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_extension() {
        let validator = create_validator();

        assert_eq!(validator.validate_extension("photo.JPG").unwrap(), "jpg");
        assert_eq!(validator.validate_extension("notes.txt").unwrap(), "txt");
        assert!(validator.validate_extension("malware.exe").is_err());
        assert!(validator.validate_extension("noextension").is_err());
        assert!(validator.validate_extension("archive.tar.gz").is_err());
    }

    #[test]
    fn test_validate_content_type() {
        let validator = create_validator();

        assert_eq!(
            validator
                .validate_content_type(Some("Text/Plain; charset=utf-8"))
                .unwrap(),
            "text/plain"
        );
        assert!(matches!(
            validator.validate_content_type(None),
            Err(ValidationError::MissingContentType)
        ));
        assert!(matches!(
            validator.validate_content_type(Some("application/x-msdownload")),
            Err(ValidationError::InvalidContentType { .. })
        ));
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(ValidationError::EmptyFile.rejection(), FileRejection::NoFile);
        assert_eq!(
            ValidationError::FileTooLarge { size: 2, max: 1 }.rejection(),
            FileRejection::TooLarge
        );
        assert_eq!(
            ValidationError::MissingContentType.rejection(),
            FileRejection::DisallowedMimeType
        );
    }

    #[test]
    fn test_sanitize_original_name() {
        assert_eq!(sanitize_original_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_original_name("C:\\Users\\me\\cv.docx"), "cv.docx");
        assert_eq!(sanitize_original_name("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_original_name(".."), "file");
        assert_eq!(sanitize_original_name(""), "file");
    }

    #[test]
    fn test_image_extension() {
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("bmp"));
        assert!(!is_image_extension("pdf"));
    }
}
