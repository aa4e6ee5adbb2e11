//! API constants

/// Versioned API prefix
pub const API_PREFIX: &str = "/api/v1";

pub const SERVICE_NAME: &str = "storeguard";

/// Headers set by the upstream identity collaborator
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

/// Upper bound for audit query limits
pub const MAX_AUDIT_LIMIT: usize = 1000;

/// Multipart framing allowance on top of the maximum upload size
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Server-wide cap on in-flight requests
pub const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
