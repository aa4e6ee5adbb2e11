//! Storeguard API Library
//!
//! HTTP surface of the request filter, the file intake policy and the audit sink.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
mod services;
pub mod setup;
mod utils;

pub mod auth;
pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
