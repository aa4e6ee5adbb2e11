//! HTTP error response body
//!
//! `IntoResponse` for `AppError` lives in storeguard-api (orphan rule).

use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
            error_type: None,
        }
    }

    pub fn with_details(mut self, details: String, error_type: impl Into<String>) -> Self {
        self.details = Some(details);
        self.error_type = Some(error_type.into());
        self
    }
}
