//! File intake policy
//!
//! Validation, image sanitizing and signature scanning for uploaded files.
//! [`FileIntakePolicy::accept`] runs the whole sequence and persists accepted bytes.

pub mod image;
pub mod intake;
pub mod scan;
pub mod validator;

pub use crate::image::{ImageError, ImageSanitizer, SanitizedImage};
pub use intake::{FileIntakePolicy, FileIntakeResult, IncomingFile, IntakeError};
pub use scan::{ContentScanner, SignatureScanner, SCAN_HEADER_LEN};
pub use validator::{IntakeValidator, ValidationError};
