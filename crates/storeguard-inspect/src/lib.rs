//! Pattern-based request inspection
//!
//! - [`PatternCatalog`]: the process-wide, read-only set of detection rules
//! - [`ContentInspector`]: checks one value against the catalog
//! - [`RequestFilter`]: checks every field of a request and yields a [`Verdict`]
//!
//! Nothing in this crate performs I/O; callers decide what to log and respond.

pub mod catalog;
pub mod fields;
pub mod filter;
pub mod inspector;

pub use catalog::{DetectionRule, PatternCatalog};
pub use fields::parse_urlencoded;
pub use filter::{FieldSource, InspectionFinding, RequestFilter, Verdict};
pub use inspector::ContentInspector;
