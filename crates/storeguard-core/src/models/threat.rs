use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of hostile input a detection rule looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatCategory {
    SqlInjection,
    Xss,
    PathTraversal,
    CommandExecution,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::SqlInjection => "SqlInjection",
            ThreatCategory::Xss => "Xss",
            ThreatCategory::PathTraversal => "PathTraversal",
            ThreatCategory::CommandExecution => "CommandExecution",
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
