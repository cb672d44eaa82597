//! Error types for workflow-observability

use thiserror::Error;

/// Errors that can occur in observability operations
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// Subscriber installation failed
    #[error("Tracing error: {0}")]
    Tracing(String),

    /// A `traceparent` value that does not follow the W3C format
    #[error("Invalid traceparent: {0}")]
    InvalidTraceParent(String),
}

/// Result type alias for observability operations
pub type Result<T> = std::result::Result<T, ObservabilityError>;
