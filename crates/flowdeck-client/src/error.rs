//! Error types for the pipeline service client

use thiserror::Error;

use crate::pipelines::SaveRejection;

/// Errors raised when talking to the pipeline service
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a usable response
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an unexpected status
    #[error("Pipeline service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The requested pipeline does not exist on the service
    #[error("Pipeline not found: {0}")]
    NotFound(String),

    /// The token was missing, expired or not allowed to do this
    #[error("Not authorized against the pipeline service")]
    Unauthorized,

    /// The service refused to persist the pipeline
    #[error("{}", .0.message)]
    Rejected(SaveRejection),

    /// The result stream broke mid-flight
    #[error("Result stream error: {0}")]
    Stream(String),

    /// The caller cancelled the request
    #[error("Request was aborted")]
    Aborted,
}

impl ClientError {
    /// Whether this error means the pipeline does not exist remotely
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Whether this error is an authorization failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Whether the service rejected the pipeline content itself
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected(_))
    }

    /// Whether the failure happened below the service, in transport.
    /// These are the errors worth retrying or falling back to cache for.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::Stream(_))
    }

    /// The rejection details, when the service refused the pipeline
    pub fn rejection(&self) -> Option<&SaveRejection> {
        match self {
            ClientError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Result type for pipeline service operations
pub type ClientResult<T> = Result<T, ClientError>;
