//! Detection rule catalog

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use storeguard_core::ThreatCategory;

/// A named, precompiled matcher for one kind of hostile input.
#[derive(Debug, Clone)]
pub struct DetectionRule {
    name: String,
    category: ThreatCategory,
    pattern: Regex,
    case_insensitive: bool,
}

impl DetectionRule {
    /// Compile a case-insensitive rule.
    pub fn new(
        name: impl Into<String>,
        category: ThreatCategory,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        Self::build(name, category, pattern, true)
    }

    /// Compile a rule that matches case exactly.
    pub fn case_sensitive(
        name: impl Into<String>,
        category: ThreatCategory,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        Self::build(name, category, pattern, false)
    }

    fn build(
        name: impl Into<String>,
        category: ThreatCategory,
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            name: name.into(),
            category,
            pattern,
            case_insensitive,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ThreatCategory {
        self.category
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

/// Built-in rules as (name, category, pattern). Order is reporting priority.
const BUILTIN_RULES: &[(&str, ThreatCategory, &str)] = &[
    (
        "sql-boolean-tautology",
        ThreatCategory::SqlInjection,
        r"\b(?:OR|AND)\b.*=",
    ),
    (
        "sql-comment-terminated",
        ThreatCategory::SqlInjection,
        r"';.*--",
    ),
    (
        "sql-literal-tautology",
        ThreatCategory::SqlInjection,
        r"1\s*=\s*1",
    ),
    (
        "sql-union-select",
        ThreatCategory::SqlInjection,
        r"\bUNION\b.*\bSELECT\b",
    ),
    (
        "sql-destructive-statement",
        ThreatCategory::SqlInjection,
        r"\bDROP\b|\bDELETE\b|\bUPDATE\b.*\bSET\b",
    ),
    ("xss-script-tag", ThreatCategory::Xss, r"<\s*script\b[^>]*>"),
    ("xss-javascript-uri", ThreatCategory::Xss, r"javascript\s*:"),
    (
        "xss-event-handler",
        ThreatCategory::Xss,
        r"\bon(?:error|load)\s*=",
    ),
    (
        "directory-traversal",
        ThreatCategory::PathTraversal,
        r"\.\.[/\\]",
    ),
    (
        "sql-exec-procedure",
        ThreatCategory::CommandExecution,
        r"\bEXEC(?:UTE)?\b",
    ),
    (
        "shell-substitution",
        ThreatCategory::CommandExecution,
        r"\$\([^)]*\)",
    ),
];

static BUILTIN: LazyLock<PatternCatalog> = LazyLock::new(|| {
    let rules = BUILTIN_RULES
        .iter()
        .map(|(name, category, pattern)| DetectionRule::new(*name, *category, pattern))
        .collect::<Result<Vec<_>, _>>()
        .expect("built-in detection rules must compile");
    PatternCatalog::from_rules(rules)
});

/// Ordered, immutable collection of detection rules.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    rules: Vec<DetectionRule>,
}

impl PatternCatalog {
    /// The built-in catalog, compiled once on first use and shared by every request.
    pub fn builtin() -> &'static PatternCatalog {
        &BUILTIN
    }

    pub fn from_rules(rules: Vec<DetectionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[DetectionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
