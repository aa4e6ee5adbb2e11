use serde::{Deserialize, Serialize};

/// Why an uploaded file was turned away.
///
/// The `Display` text is what the uploader sees, so it names the problem
/// without ever mentioning paths or internal limits beyond the public ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FileRejection {
    #[error("No file was provided")]
    NoFile,
    #[error("File type is not allowed")]
    BadExtension,
    #[error("File exceeds the maximum allowed size")]
    TooLarge,
    #[error("Invalid or corrupted image file")]
    CorruptImage,
    #[error("Content type is not allowed")]
    DisallowedMimeType,
    #[error("File failed the safety scan")]
    UnsafeContent,
}

impl FileRejection {
    /// Machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            FileRejection::NoFile => "NO_FILE",
            FileRejection::BadExtension => "BAD_EXTENSION",
            FileRejection::TooLarge => "TOO_LARGE",
            FileRejection::CorruptImage => "CORRUPT_IMAGE",
            FileRejection::DisallowedMimeType => "DISALLOWED_MIME_TYPE",
            FileRejection::UnsafeContent => "UNSAFE_CONTENT",
        }
    }
}
