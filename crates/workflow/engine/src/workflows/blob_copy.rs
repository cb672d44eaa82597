use super::Workflow;
use crate::capabilities::COPY_BLOB;
use crate::context::OrchestrationContext;
use crate::sequencer::OrchestrationRun;
use async_trait::async_trait;
use workflow_types::{BlobCopyRequest, BlobWriteResponse, CopyBlobRequest, WorkflowOutput};

/// Server-side copy of one blob to another
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobCopyWorkflow;

impl BlobCopyWorkflow {
    pub const NAME: &'static str = "BlobCopy";
}

#[async_trait]
impl Workflow for BlobCopyWorkflow {
    type Input = BlobCopyRequest;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, ctx: &OrchestrationContext, input: BlobCopyRequest) -> WorkflowOutput {
        let mut run = OrchestrationRun::new(ctx);
        let Some(input) = run.validate(input) else {
            return run.finish();
        };
        let (Some(source), Some(target)) =
            (input.source_blob_storage_info, input.target_blob_storage_info)
        else {
            return run.finish();
        };

        let copied: Option<BlobWriteResponse> = run
            .step(COPY_BLOB, COPY_BLOB, CopyBlobRequest::new(source.clone(), target.clone()))
            .await;
        let Some(copied) = copied else {
            return run.finish();
        };
        run.note(
            COPY_BLOB,
            format!("Copied {} bytes to '{}'.", copied.bytes_written, copied.blob_uri),
        );

        run.complete(format!("Blob '{}' copied to '{}'.", source, target));
        run.finish()
    }
}
