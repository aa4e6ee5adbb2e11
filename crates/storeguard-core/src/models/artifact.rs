use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::AppError;

const MAX_CATEGORY_LEN: usize = 50;

/// Category tag of an upload; doubles as its storage namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactCategory(String);

impl ArtifactCategory {
    pub const DEFAULT: &'static str = "general";

    /// Parse a user supplied category.
    ///
    /// Only ASCII letters, digits, `-` and `_` are accepted and the result is
    /// lowercased, so a category can never escape its storage namespace.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        if trimmed.len() > MAX_CATEGORY_LEN {
            return Err(AppError::InvalidInput(format!(
                "Category must be at most {} characters",
                MAX_CATEGORY_LEN
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::InvalidInput(
                "Category may only contain letters, digits, '-' and '_'".to_string(),
            ));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ArtifactCategory {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of the byte-signature heuristic scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ScanVerdict {
    Clean,
    Unsafe(String),
}

impl ScanVerdict {
    pub const CLEAN: &'static str = "Clean";

    pub fn is_safe(&self) -> bool {
        matches!(self, ScanVerdict::Clean)
    }

    /// Human-readable scan result as stored alongside the record
    pub fn summary(&self) -> String {
        match self {
            ScanVerdict::Clean => Self::CLEAN.to_string(),
            ScanVerdict::Unsafe(reason) => {
                format!("Potentially dangerous file detected: {}", reason)
            }
        }
    }

    /// Rebuild a verdict from its persisted columns.
    pub fn from_parts(is_safe: bool, summary: &str) -> Self {
        if is_safe {
            ScanVerdict::Clean
        } else {
            let reason = summary
                .strip_prefix("Potentially dangerous file detected: ")
                .unwrap_or(summary);
            ScanVerdict::Unsafe(reason.to_string())
        }
    }
}

/// Persisted metadata for an accepted upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedArtifact {
    pub id: Uuid,
    pub original_name: String,
    pub storage_name: String,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub category: ArtifactCategory,
    pub owner_id: String,
    pub product_id: Option<i64>,
    pub scanned: bool,
    pub scan: ScanVerdict,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedArtifact {
    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.owner_id == actor_id
    }

    pub fn is_safe(&self) -> bool {
        self.scan.is_safe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_normalizes() {
        assert_eq!(ArtifactCategory::parse("Product-Images").unwrap().as_str(), "product-images");
        assert_eq!(ArtifactCategory::parse("").unwrap(), ArtifactCategory::default());
        assert_eq!(ArtifactCategory::parse("   ").unwrap().as_str(), "general");
    }

    #[test]
    fn test_category_parse_rejects_separators() {
        assert!(ArtifactCategory::parse("../etc").is_err());
        assert!(ArtifactCategory::parse("a/b").is_err());
        assert!(ArtifactCategory::parse("a\\b").is_err());
        assert!(ArtifactCategory::parse(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_scan_verdict_round_trips_through_columns() {
        let unsafe_verdict = ScanVerdict::Unsafe("executable header".to_string());
        let rebuilt = ScanVerdict::from_parts(false, &unsafe_verdict.summary());
        assert_eq!(rebuilt, unsafe_verdict);
        assert_eq!(ScanVerdict::from_parts(true, "Clean"), ScanVerdict::Clean);
    }
}
