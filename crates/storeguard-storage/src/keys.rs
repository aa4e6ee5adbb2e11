//! Storage key generation.

use storeguard_core::ArtifactCategory;
use uuid::Uuid;

pub const UPLOAD_ROOT: &str = "uploads";

/// Collision-resistant storage name: a random v4 UUID plus the original extension.
pub fn generate_storage_name(extension: &str) -> String {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    if extension.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        format!("{}.{}", Uuid::new_v4(), extension)
    }
}

/// Key of an artifact inside its category namespace.
pub fn artifact_key(category: &ArtifactCategory, storage_name: &str) -> String {
    format!("{}/{}/{}", UPLOAD_ROOT, category, storage_name)
}
