//! Error types for session operations

use thiserror::Error;

/// Boxed cause carried by transport failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Credential store or client configuration is unreadable or malformed
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// No credential for the domain, or the server rejected the credential
    #[error("Authorization error: {message}")]
    Auth {
        /// What was rejected
        message: String,
    },

    /// The requested resource does not exist
    #[error("Not found: {resource}")]
    NotFound {
        /// Human-readable target
        resource: String,
    },

    /// Caller supplied an invalid parameter
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Which argument and why
        message: String,
    },

    /// Network-level failure; the request never produced a response
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// Unexpected non-success status
    #[error("Server error: {status} - {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// Response body does not match the expected shape
    #[error("Protocol error: {0}")]
    Protocol(#[from] DecodeError),

    /// Operation cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,
}

impl ClientError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        ClientError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn auth(message: impl Into<String>) -> Self {
        ClientError::Auth {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ClientError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wrap any error as a transport failure
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ClientError::Transport(err.into())
    }

    /// Whether repeating the same call may succeed
    ///
    /// True for network failures and unexpected server statuses. Errors that
    /// describe the request itself (`NotFound`, `InvalidArgument`, `Auth`) will
    /// fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Server { .. })
    }

    /// Map a non-success HTTP status to an error
    pub(crate) fn from_status(status: u16, resource: &str, message: String) -> Self {
        match status {
            404 => ClientError::NotFound {
                resource: resource.to_string(),
            },
            401 | 403 => ClientError::Auth {
                message: format!("server rejected authorization ({}): {}", status, message),
            },
            _ => ClientError::Server { status, message },
        }
    }
}

/// Failure to turn a response body into the expected entity
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Body is not valid JSON or an element has the wrong fields
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Root element has the wrong type
    #[error("unexpected root element: expected {expected}")]
    UnexpectedRoot {
        /// JSON type the shape needs
        expected: &'static str,
    },

    /// Required member is absent
    #[error("\"{field}\" is not given")]
    MissingField {
        /// Member name
        field: &'static str,
    },

    /// Decoder produced a different shape than the one requested
    #[error("decoder returned {actual} for a {expected} request")]
    ShapeMismatch {
        /// Shape the operation asked for
        expected: &'static str,
        /// Shape the decoder returned
        actual: &'static str,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(Box::new(err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Protocol(DecodeError::Json(err))
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::config(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::config(err.to_string())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
