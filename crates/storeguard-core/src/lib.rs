//! Storeguard Core Library
//!
//! Domain models, error types and configuration shared by the request filter,
//! the file intake policy and the security event sink.

pub mod config;
pub mod error;
pub mod models;
pub mod text;

pub use config::{BaseConfig, Config, GuardConfig, UnsafeUploadAction};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    Actor, ArtifactCategory, FileRejection, ScanVerdict, SecurityEvent, SecurityEventKind,
    Severity, ThreatCategory, UploadedArtifact,
};
