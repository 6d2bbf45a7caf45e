//! Shared leaf types for the mailcast delivery engine.

pub mod domain;
pub mod logging;

pub use domain::Domain;
pub use tracing;
