pub mod ip_extraction;
pub mod multipart;
