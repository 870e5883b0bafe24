use std::path::PathBuf;

use thiserror::Error;

/// Failures of the process-level adapters: files, signals, the HTTP client
/// builder and the tracing subscriber.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to read `{}`: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("signal handler failed: {0}")]
    Signal(#[source] std::io::Error),
    #[error("failed to build backend client: {message}")]
    HttpClient { message: String },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn http_client(message: impl Into<String>) -> Self {
        Self::HttpClient {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
