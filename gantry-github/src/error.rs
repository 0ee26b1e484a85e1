//! Error types for the GitHub driver

use gantry_core::ParseRepoError;
use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the GitHub driver
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required configuration is missing or blank
    #[error("{0}")]
    Config(String),

    /// The configured repository reference could not be parsed
    #[error("Invalid repository: {0}")]
    InvalidRepo(#[from] ParseRepoError),

    /// The operation needs a repository but the client targets an organization
    #[error("{0} requires a repository, but an organization was configured")]
    RepositoryRequired(&'static str),

    /// The platform does not offer this capability
    #[error("{0}")]
    Unsupported(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Runner provisioning or launch failed
    #[error("Failed preparing GitHub runner: {0}")]
    RunnerSetup(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if this error rejects a capability the platform lacks
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}
