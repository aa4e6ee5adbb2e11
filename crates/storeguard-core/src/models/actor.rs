use serde::{Deserialize, Serialize};

/// Actor identifier used for events raised by the service itself.
pub const SYSTEM_ACTOR_ID: &str = "system";

/// Placeholder for a missing display name or origin address.
pub const UNKNOWN: &str = "Unknown";

pub const ADMIN_ROLE: &str = "Admin";

/// An authenticated principal, as asserted by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            roles: Vec::new(),
        }
    }

    pub fn system() -> Self {
        Self {
            id: SYSTEM_ACTOR_ID.to_string(),
            display_name: SYSTEM_ACTOR_ID.to_string(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}
