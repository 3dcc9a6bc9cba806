//! Error types for fetchplus.

use thiserror::Error;

/// Boxed error produced by an [`HttpClient`](crate::HttpClient) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("{0}")]
    Transport(#[source] BoxError),

    #[error("cache store error: {0}")]
    CacheStore(#[from] StoreError),

    #[error("invalid cache policy snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("{source} (gave up after {attempts} attempts)")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to decode response body: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any transport-level error.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Transport(err.into())
    }

    /// The failure that ended the last attempt, unwrapping [`Error::RetryExhausted`].
    pub fn last_failure(&self) -> &Error {
        match self {
            Self::RetryExhausted { source, .. } => source.last_failure(),
            other => other,
        }
    }
}

/// Failure reported by a [`CacheStore`](crate::CacheStore).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_exhausted_keeps_underlying_message() {
        let err = Error::RetryExhausted {
            attempts: 3,
            source: Box::new(Error::transport("socket hang up")),
        };

        assert!(err.to_string().contains("socket hang up"));
        assert!(err.to_string().contains("3 attempts"));
        assert!(matches!(err.last_failure(), Error::Transport(_)));
    }

    #[test]
    fn store_error_display() {
        let err: Error = StoreError::new("connection refused").into();
        assert_eq!(err.to_string(), "cache store error: connection refused");
    }
}
