//! Storeguard Storage Library
//!
//! Byte storage for accepted uploads. Keys are namespaced per artifact category:
//! `uploads/{category}/{storage_name}` (see [`keys`]).

pub mod keys;
pub mod local;
pub mod traits;

pub use keys::{artifact_key, generate_storage_name, UPLOAD_ROOT};
pub use local::LocalStorage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
