//! Workflow Orchestration Engine
//!
//! The engine runs durable workflows that drive external, stateless
//! services through validated, ordered steps. Orchestration bodies are
//! replay-safe: they never perform I/O themselves, they describe activity
//! calls and wait for their outcomes.
//!
//! # Key Principle
//!
//! **An orchestration is a pure function of its input and the results of the
//! activities it has already called.**
//!
//! All I/O happens inside activities. On replay the same calls are issued in
//! the same order with byte-identical payloads, and recorded outcomes are
//! fed back instead of calling anything.
//!
//! # Architecture
//!
//! - [`ActivityRegistry`]: Resolves capability names to activities
//! - [`InMemoryScheduler`]: Runs activity calls and records their history
//! - [`OrchestrationContext`]: Invocation wrapper around every activity call
//! - [`OrchestrationRun`]: Step sequencing state machine
//! - [`pagination`]: Paged listing with per-page fan-out and a fan-in join
//! - [`WorkflowHost`]: Starts instances, reports status, replays history
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use workflow_engine::{ActivityRegistry, EngineConfig, WorkflowHost};
//! use workflow_types::{ActivityError, BlobWriteResponse, CopyBlobRequest};
//!
//! # async fn demo() -> workflow_engine::HostResult<()> {
//! let mut registry = ActivityRegistry::new();
//! registry.register_fn("CopyBlob", |req: CopyBlobRequest| async move {
//!     Ok::<_, ActivityError>(BlobWriteResponse {
//!         blob_uri: req.target.path(),
//!         bytes_written: 0,
//!     })
//! });
//!
//! let host = WorkflowHost::with_builtin_workflows(Arc::new(registry), &EngineConfig::default());
//! let output = host
//!     .run(
//!         "BlobCopy",
//!         json!({
//!             "sourceBlobStorageInfo": { "containerName": "raw", "blobName": "a.txt" },
//!             "targetBlobStorageInfo": { "containerName": "curated", "blobName": "a.txt" }
//!         }),
//!     )
//!     .await?;
//! assert!(output.is_completed());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod activity;
pub mod capabilities;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod pagination;
pub mod registry;
pub mod scheduler;
pub mod sequencer;
pub mod workflows;

// Re-export main types
pub use activity::{Activity, ActivityContext, Capability, CapabilityActivity, FnActivity};
pub use crate::config::EngineConfig;
pub use context::{OrchestrationContext, PendingActivity};
pub use error::{HostError, HostResult, InvocationError};
pub use host::{ReplayOutcome, WorkflowHost};
pub use pagination::{fan_out_fan_in, pages, BatchOutcome, FanInOutcome};
pub use registry::ActivityRegistry;
pub use scheduler::{
    ActivityCall, ActivityHandle, ActivityScheduler, HistoryEvent, InMemoryScheduler,
};
pub use sequencer::OrchestrationRun;
pub use workflows::{
    execute_workflow, BlobCopyWorkflow, DocumentAnalysisWorkflow, EmbeddingWorkflow,
    ErasedWorkflow, ParquetConversionWorkflow, SecretToBlobWorkflow, Workflow,
};

/// Install the global log subscriber described by `config`
pub fn init_logging(config: &EngineConfig) -> workflow_observability::Result<()> {
    workflow_observability::init_tracing(&config.tracing_config())
}
