//! REST collaborator for the Loumo backend.

mod client;
mod error;

pub use client::{ApiResponse, BackendClient};
pub use error::ApiError;
