//! Append-only security/audit events
//!
//! Every security-relevant action (request filter rejections, file operations,
//! role changes, authentication anomalies) is described by one [`SecurityEvent`].
//! Field lengths are bounded at construction so a hostile value can never blow
//! up the sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::actor::{Actor, SYSTEM_ACTOR_ID, UNKNOWN};
use crate::text::truncate_chars;

pub const MAX_ACTOR_ID_LEN: usize = 128;
pub const MAX_ACTOR_NAME_LEN: usize = 100;
pub const MAX_ACTION_LEN: usize = 200;
pub const MAX_DETAIL_LEN: usize = 500;
pub const MAX_ORIGIN_LEN: usize = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }

    /// Parse a severity case-insensitively; unknown values fall back to `Info`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "warning" => Severity::Warning,
            "critical" => Severity::Critical,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action tag of a security event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecurityEventKind {
    RequestBlocked,
    FileUpload,
    FileUploadRejected,
    FileDownload,
    FileDelete,
    UnauthorizedAccess,
    RoleChanged,
    AuthenticationFailure,
    Other(String),
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &str {
        match self {
            SecurityEventKind::RequestBlocked => "RequestBlocked",
            SecurityEventKind::FileUpload => "FileUpload",
            SecurityEventKind::FileUploadRejected => "FileUploadRejected",
            SecurityEventKind::FileDownload => "FileDownload",
            SecurityEventKind::FileDelete => "FileDelete",
            SecurityEventKind::UnauthorizedAccess => "UnauthorizedAccess",
            SecurityEventKind::RoleChanged => "RoleChanged",
            SecurityEventKind::AuthenticationFailure => "AuthenticationFailure",
            SecurityEventKind::Other(tag) => tag,
        }
    }
}

impl From<&str> for SecurityEventKind {
    fn from(value: &str) -> Self {
        match value {
            "RequestBlocked" => SecurityEventKind::RequestBlocked,
            "FileUpload" => SecurityEventKind::FileUpload,
            "FileUploadRejected" => SecurityEventKind::FileUploadRejected,
            "FileDownload" => SecurityEventKind::FileDownload,
            "FileDelete" => SecurityEventKind::FileDelete,
            "UnauthorizedAccess" => SecurityEventKind::UnauthorizedAccess,
            "RoleChanged" => SecurityEventKind::RoleChanged,
            "AuthenticationFailure" => SecurityEventKind::AuthenticationFailure,
            other => SecurityEventKind::Other(truncate_chars(other, MAX_ACTION_LEN)),
        }
    }
}

impl From<String> for SecurityEventKind {
    fn from(value: String) -> Self {
        SecurityEventKind::from(value.as_str())
    }
}

impl From<SecurityEventKind> for String {
    fn from(kind: SecurityEventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub kind: SecurityEventKind,
    pub actor_id: String,
    pub actor_name: String,
    pub detail: String,
    pub origin: String,
    pub severity: Severity,
    pub success: bool,
    pub occurred_at: DateTime<Utc>,
}

impl SecurityEvent {
    /// New successful `Info` event attributed to the `system` actor.
    pub fn new(kind: SecurityEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            actor_id: SYSTEM_ACTOR_ID.to_string(),
            actor_name: SYSTEM_ACTOR_ID.to_string(),
            detail: String::new(),
            origin: UNKNOWN.to_string(),
            severity: Severity::Info,
            success: true,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: &Actor) -> Self {
        self.actor_id = truncate_chars(&actor.id, MAX_ACTOR_ID_LEN);
        self.actor_name = truncate_chars(&actor.display_name, MAX_ACTOR_NAME_LEN);
        self
    }

    pub fn with_detail(mut self, detail: impl AsRef<str>) -> Self {
        self.detail = truncate_chars(detail.as_ref(), MAX_DETAIL_LEN);
        self
    }

    pub fn with_origin(mut self, origin: impl AsRef<str>) -> Self {
        let origin = origin.as_ref().trim();
        self.origin = if origin.is_empty() {
            UNKNOWN.to_string()
        } else {
            truncate_chars(origin, MAX_ORIGIN_LEN)
        };
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_defaults() {
        let event = SecurityEvent::new(SecurityEventKind::FileUpload);
        assert_eq!(event.actor_id, "system");
        assert_eq!(event.origin, "Unknown");
        assert_eq!(event.severity, Severity::Info);
        assert!(event.success);
    }

    #[test]
    fn test_fields_are_bounded() {
        let actor = Actor::new("u1", Some("n".repeat(300)));
        let event = SecurityEvent::new(SecurityEventKind::FileDelete)
            .with_actor(&actor)
            .with_detail("d".repeat(2_000))
            .with_origin("1".repeat(100));

        assert_eq!(event.actor_name.chars().count(), MAX_ACTOR_NAME_LEN);
        assert_eq!(event.detail.chars().count(), MAX_DETAIL_LEN);
        assert_eq!(event.origin.chars().count(), MAX_ORIGIN_LEN);
    }

    #[test]
    fn test_blank_origin_is_unknown() {
        let event = SecurityEvent::new(SecurityEventKind::FileDownload).with_origin("  ");
        assert_eq!(event.origin, "Unknown");
    }

    #[test]
    fn test_severity_parse_ignores_case() {
        assert_eq!(Severity::parse("Warning"), Severity::Warning);
        assert_eq!(Severity::parse("warning"), Severity::Warning);
        assert_eq!(Severity::parse("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::parse(" critical "), Severity::Critical);
        assert_eq!(Severity::parse("info"), Severity::Info);
        assert_eq!(Severity::parse("severe"), Severity::Info);
    }

    #[test]
    fn test_kind_parses_known_and_free_form_tags() {
        assert_eq!(
            SecurityEventKind::from("RequestBlocked"),
            SecurityEventKind::RequestBlocked
        );
        assert_eq!(
            SecurityEventKind::from("PasswordReset"),
            SecurityEventKind::Other("PasswordReset".to_string())
        );
        assert_eq!(SecurityEventKind::FileDelete.as_str(), "FileDelete");
    }

    #[test]
    fn test_kind_serializes_as_plain_string() {
        let json = serde_json::to_string(&SecurityEventKind::RoleChanged).unwrap();
        assert_eq!(json, "\"RoleChanged\"");
    }
}
