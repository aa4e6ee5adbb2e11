//! Storeguard Infrastructure Library
//!
//! Shared infrastructure for the storeguard service:
//! - Middleware (request ID, security headers)
//! - Tracing subscriber initialization
//! - Error response body

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
    SecurityHeaderPolicy,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, LogFormat};

pub use error::ErrorResponse;
