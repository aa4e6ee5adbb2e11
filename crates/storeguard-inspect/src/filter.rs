//! Request-level filtering
//!
//! A [`RequestFilter`] walks the `(name, value)` pairs of one request in order and
//! stops at the first value the inspector flags. The resulting [`InspectionFinding`]
//! is meant for internal logging only; clients get a fixed message.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use storeguard_core::error::AppError;
use storeguard_core::text::truncate_chars;
use storeguard_core::ThreatCategory;

use crate::catalog::PatternCatalog;
use crate::inspector::ContentInspector;

/// Longest offending value kept in a finding.
pub const MAX_FINDING_VALUE_CHARS: usize = 200;
/// Longest field name kept in a finding.
pub const MAX_FINDING_FIELD_CHARS: usize = 100;

/// Where an inspected field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Query,
    Form,
    Multipart,
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldSource::Query => "query",
            FieldSource::Form => "form",
            FieldSource::Multipart => "multipart",
        })
    }
}

/// Evidence that one field of a request matched a detection rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionFinding {
    pub field: String,
    pub category: ThreatCategory,
    pub rule: String,
    pub value: String,
    pub source: FieldSource,
    pub detected_at: DateTime<Utc>,
}

impl InspectionFinding {
    /// One-line description suitable for an audit detail string.
    pub fn summary(&self) -> String {
        format!(
            "Blocked {} field '{}': {} ({}) value={:?}",
            self.source, self.field, self.category, self.rule, self.value
        )
    }

    pub fn to_error(&self) -> AppError {
        AppError::ValidationRejected {
            field: self.field.clone(),
            category: self.category,
        }
    }
}

/// Accept/reject outcome for a whole request.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    Rejected(InspectionFinding),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn finding(&self) -> Option<&InspectionFinding> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(finding) => Some(finding),
        }
    }

    /// `Ok(())` when accepted, otherwise the matching `ValidationRejected` error.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Verdict::Accepted => Ok(()),
            Verdict::Rejected(finding) => Err(finding.to_error()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequestFilter<'a> {
    inspector: ContentInspector<'a>,
}

impl Default for RequestFilter<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RequestFilter<'static> {
    /// Filter backed by the built-in catalog.
    pub fn builtin() -> Self {
        Self {
            inspector: ContentInspector::default(),
        }
    }
}

impl<'a> RequestFilter<'a> {
    pub fn new(catalog: &'a PatternCatalog) -> Self {
        Self {
            inspector: ContentInspector::new(catalog),
        }
    }

    /// Inspect `fields` in order and reject on the first offending value.
    ///
    /// Fields after the first offending one are not read from the iterator.
    pub fn filter<I, K, V>(&self, source: FieldSource, fields: I) -> Verdict
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in fields {
            let value = value.as_ref();
            if let Some(rule) = self.inspector.inspect(value) {
                return Verdict::Rejected(InspectionFinding {
                    field: truncate_chars(name.as_ref(), MAX_FINDING_FIELD_CHARS),
                    category: rule.category(),
                    rule: rule.name().to_string(),
                    value: truncate_chars(value, MAX_FINDING_VALUE_CHARS),
                    source,
                    detected_at: Utc::now(),
                });
            }
        }
        Verdict::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_all_clean_fields_are_accepted() {
        let verdict = RequestFilter::builtin().filter(
            FieldSource::Query,
            [("q", "blue widget"), ("email", "john@example.com"), ("page", "")],
        );
        assert_eq!(verdict, Verdict::Accepted);
        assert!(verdict.into_result().is_ok());
    }

    #[test]
    fn test_username_tautology_is_rejected() {
        let verdict = RequestFilter::builtin().filter(
            FieldSource::Query,
            vec![("username".to_string(), "admin' OR '1'='1".to_string())],
        );
        let finding = verdict.finding().expect("should be rejected");
        assert_eq!(finding.field, "username");
        assert_eq!(finding.category, ThreatCategory::SqlInjection);
        assert_eq!(finding.source, FieldSource::Query);
        assert_eq!(finding.value, "admin' OR '1'='1");
    }

    #[test]
    fn test_first_offending_field_is_reported_and_rest_skipped() {
        let consumed = Cell::new(0);
        let fields = [
            ("name", "blue widget"),
            ("comment", "<script>alert(1)</script>"),
            ("path", "../../etc/passwd"),
            ("other", "1=1"),
        ];
        let verdict = RequestFilter::builtin().filter(
            FieldSource::Form,
            fields.iter().inspect(|_| consumed.set(consumed.get() + 1)).copied(),
        );

        let finding = verdict.finding().unwrap();
        assert_eq!(finding.field, "comment");
        assert_eq!(finding.category, ThreatCategory::Xss);
        assert_eq!(consumed.get(), 2);
    }

    #[test]
    fn test_finding_value_is_truncated() {
        let long = format!("{}{}", "../", "a".repeat(1_000));
        let verdict = RequestFilter::builtin().filter(FieldSource::Query, [("f", long.as_str())]);
        let finding = verdict.finding().unwrap();
        assert_eq!(finding.value.chars().count(), MAX_FINDING_VALUE_CHARS);
    }

    #[test]
    fn test_rejection_maps_to_generic_error() {
        let verdict =
            RequestFilter::builtin().filter(FieldSource::Query, [("id", "1 UNION SELECT 1")]);
        match verdict.into_result() {
            Err(AppError::ValidationRejected { field, category }) => {
                assert_eq!(field, "id");
                assert_eq!(category, ThreatCategory::SqlInjection);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_summary_names_field_and_rule() {
        let verdict =
            RequestFilter::builtin().filter(FieldSource::Multipart, [("category", "../x")]);
        let summary = verdict.finding().unwrap().summary();
        assert!(summary.contains("multipart"));
        assert!(summary.contains("category"));
        assert!(summary.contains("directory-traversal"));
    }

    #[test]
    fn test_finding_serializes() {
        let verdict = RequestFilter::builtin().filter(FieldSource::Query, [("q", "1=1")]);
        let json = serde_json::to_value(verdict.finding().unwrap()).unwrap();
        assert_eq!(json["category"], "SqlInjection");
        assert_eq!(json["source"], "query");
    }
}
