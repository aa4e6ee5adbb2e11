//! Image sanitizing for uploads

mod sanitizer;

pub use sanitizer::{ImageError, ImageSanitizer, SanitizedImage};
