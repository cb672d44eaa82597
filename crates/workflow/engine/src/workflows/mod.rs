//! Concrete workflows
//!
//! Each workflow is an orchestration body: a pure function of its input and
//! the results of the activities it has called so far. It never touches the
//! outside world except through [`OrchestrationContext`].

mod blob_copy;
mod document_analysis;
mod embedding;
mod parquet_conversion;
mod secret_to_blob;

pub use blob_copy::BlobCopyWorkflow;
pub use document_analysis::DocumentAnalysisWorkflow;
pub use embedding::EmbeddingWorkflow;
pub use parquet_conversion::ParquetConversionWorkflow;
pub use secret_to_blob::SecretToBlobWorkflow;

use crate::context::OrchestrationContext;
use crate::scheduler::ActivityScheduler;
use crate::sequencer::OrchestrationRun;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use workflow_observability::{extract, Tracer};
use workflow_types::{InstanceId, ObservabilityProperties, WorkflowOutput, WorkflowRequest};

/// An orchestration body with a typed input
#[async_trait]
pub trait Workflow: Send + Sync + 'static {
    type Input: WorkflowRequest + DeserializeOwned + Send + 'static;

    /// Stable name; also the step identifier of the completion entry
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &OrchestrationContext, input: Self::Input) -> WorkflowOutput;
}

/// Object-safe form of [`Workflow`] taking its input as JSON
#[async_trait]
pub trait ErasedWorkflow: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run_json(&self, ctx: &OrchestrationContext, input: Value) -> WorkflowOutput;
}

#[async_trait]
impl<W: Workflow> ErasedWorkflow for W {
    fn name(&self) -> &'static str {
        Workflow::name(self)
    }

    async fn run_json(&self, ctx: &OrchestrationContext, input: Value) -> WorkflowOutput {
        match serde_json::from_value::<W::Input>(input) {
            Ok(input) => self.run(ctx, input).await,
            Err(e) => {
                let mut run = OrchestrationRun::new(ctx);
                run.reject(format!("request could not be decoded: {}", e));
                run.finish()
            }
        }
    }
}

/// Run one execution of `workflow` against `scheduler`.
///
/// The trace context carried by the input becomes the orchestration's
/// parent context, and the input's other observability properties are
/// forwarded to every activity request.
pub async fn execute_workflow(
    workflow: &dyn ErasedWorkflow,
    instance_id: InstanceId,
    input: Value,
    scheduler: Arc<dyn ActivityScheduler>,
    tracer: Tracer,
) -> WorkflowOutput {
    let properties = ObservabilityProperties::from_payload(&input);
    let trace = extract(&properties);

    tracing::info!(
        workflow = workflow.name(),
        instance_id = %instance_id,
        traced = trace.is_valid(),
        "Orchestration started"
    );

    let ctx = OrchestrationContext::new(instance_id, workflow.name(), scheduler, tracer, trace)
        .with_properties(&properties);
    let output = workflow.run_json(&ctx, input).await;

    tracing::info!(
        workflow = workflow.name(),
        instance_id = %output.instance_id,
        state = %output.state,
        calls = ctx.calls_issued(),
        "Orchestration finished"
    );
    output
}
