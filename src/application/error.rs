use thiserror::Error;

use crate::cache::{MutationError, QueryError};
use crate::config::LoadError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Top-level error of every back-office operation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Configuration(#[from] LoadError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Domain(DomainError::validation(field, message))
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// The request was rejected locally and never reached the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(DomainError::Validation { .. }))
    }

    /// Message suitable for an operator notification.
    ///
    /// Backend-reported messages are passed through verbatim.
    pub fn operator_message(&self) -> String {
        let backend = match self {
            Self::Mutation(err) => err.query_error().and_then(QueryError::backend_message),
            Self::Query(err) => err.backend_message(),
            _ => None,
        };
        backend.map_or_else(|| self.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_reported_verbatim() {
        let err = AppError::from(MutationError::Failed(QueryError::backend(
            409,
            Some("Zone still has agents".into()),
        )));
        assert_eq!(err.operator_message(), "Zone still has agents");
    }

    #[test]
    fn validation_errors_are_flagged() {
        let err = AppError::validation("name", "is required");
        assert!(err.is_validation());
        assert_eq!(err.operator_message(), "invalid `name`: is required");
    }
}
