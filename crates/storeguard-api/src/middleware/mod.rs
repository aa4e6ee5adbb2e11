//! HTTP middleware

pub mod request_filter;

pub use request_filter::request_filter_middleware;
