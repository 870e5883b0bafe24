//! Domain rules that run before any request leaves the process.

pub mod error;
pub mod filters;
pub mod validation;

pub use error::DomainError;
