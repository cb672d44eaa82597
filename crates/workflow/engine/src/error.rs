//! Error types for the workflow engine

use std::any::Any;
use thiserror::Error;
use workflow_types::{ActivityError, InstanceId};

/// Failure of one activity invocation as seen by the orchestration
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The request failed validation; nothing was scheduled
    #[error("Invalid {capability} request: {details}")]
    InvalidRequest { capability: String, details: String },

    #[error("Failed to encode {capability} request: {source}")]
    Encode {
        capability: String,
        #[source]
        source: serde_json::Error,
    },

    /// The activity raised a hard failure
    #[error("{source}")]
    Activity {
        capability: String,
        #[source]
        source: ActivityError,
    },

    #[error("{capability} returned no result")]
    EmptyResult { capability: String },

    #[error("Failed to decode {capability} result: {source}")]
    Decode {
        capability: String,
        #[source]
        source: serde_json::Error,
    },
}

impl InvocationError {
    pub fn capability(&self) -> &str {
        match self {
            Self::InvalidRequest { capability, .. }
            | Self::Encode { capability, .. }
            | Self::Activity { capability, .. }
            | Self::EmptyResult { capability }
            | Self::Decode { capability, .. } => capability,
        }
    }
}

/// Errors from the workflow host
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("Workflow already registered: {0}")]
    DuplicateWorkflow(String),

    #[error("Workflow instance not found: {0}")]
    InstanceNotFound(InstanceId),

    /// Another caller is already waiting on this instance
    #[error("Workflow instance {0} is already being awaited")]
    NotAwaitable(InstanceId),

    #[error("Workflow instance {instance_id} did not complete: {message}")]
    Join {
        instance_id: InstanceId,
        message: String,
    },

    /// Only finished instances can be removed
    #[error("Workflow instance {0} is still running")]
    StillRunning(InstanceId),

    #[error("No tokio runtime to run workflow instances on")]
    NoRuntime,
}

/// Result type alias for host operations
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Readable text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panicked without a message".to_string())
}
