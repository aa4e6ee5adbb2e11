//! Actor identity asserted by the upstream identity collaborator

pub mod actor;

pub use actor::AuthenticatedActor;
