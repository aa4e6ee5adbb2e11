//! Domain models

pub mod actor;
pub mod artifact;
pub mod intake;
pub mod security_event;
pub mod threat;

pub use actor::{Actor, ADMIN_ROLE, SYSTEM_ACTOR_ID, UNKNOWN};
pub use artifact::{ArtifactCategory, ScanVerdict, UploadedArtifact};
pub use intake::FileRejection;
pub use security_event::{SecurityEvent, SecurityEventKind, Severity};
pub use threat::ThreatCategory;
