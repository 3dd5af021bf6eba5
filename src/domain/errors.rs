use thiserror::Error;

/// Errors surfaced by the prompt template core
///
/// Every store failure is classified into one of these variants before it
/// reaches the service layer. The service never retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// Malformed or missing required input
    #[error("{0}")]
    BadRequest(String),

    /// Template, version, or id lookup miss
    #[error("{0}")]
    NotFound(String),

    /// Duplicate template name or version label
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl PromptError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

pub type PromptResult<T> = Result<T, PromptError>;
