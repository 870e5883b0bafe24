use thiserror::Error;

use crate::cache::QueryError;

/// Failure of one REST call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("backend returned status {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Backend {
        status: u16,
        message: Option<String>,
    },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid request path `{0}`")]
    Url(String),
    #[error("failed to read upload: {0}")]
    Io(String),
}

impl ApiError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ApiError> for QueryError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout => QueryError::Timeout,
            ApiError::Backend { status, message } => QueryError::backend(status, message),
            ApiError::Decode(message) => QueryError::Decode(message),
            ApiError::Transport(message) | ApiError::Io(message) => QueryError::Transport(message),
            ApiError::Url(path) => QueryError::transport(format!("invalid request path `{path}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_survives_conversion() {
        let err = ApiError::Backend {
            status: 409,
            message: Some("category has products".into()),
        };
        assert_eq!(err.status(), Some(409));

        let query: QueryError = err.into();
        assert_eq!(query.backend_message(), Some("category has products"));
        assert_eq!(query.status(), Some(409));
    }

    #[test]
    fn timeout_maps_to_timeout() {
        assert_eq!(QueryError::from(ApiError::Timeout), QueryError::Timeout);
    }
}
