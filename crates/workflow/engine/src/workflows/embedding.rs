//! Embed a blob's text and store the vector

use super::Workflow;
use crate::capabilities::{GENERATE_EMBEDDING, READ_BLOB, WRITE_BLOB};
use crate::context::OrchestrationContext;
use crate::sequencer::OrchestrationRun;
use async_trait::async_trait;
use workflow_types::{
    BlobContent, BlobWriteResponse, Embedding, EmbeddingRequest, GenerateEmbeddingRequest,
    ReadBlobRequest, WorkflowOutput, WriteBlobRequest,
};

/// `ReadBlob` → `GenerateEmbedding` → `WriteBlob`.
///
/// The vector is stored as a JSON array. Blank text or an empty vector
/// terminates the run at the step that produced it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddingWorkflow;

impl EmbeddingWorkflow {
    pub const NAME: &'static str = "Embedding";
}

#[async_trait]
impl Workflow for EmbeddingWorkflow {
    type Input = EmbeddingRequest;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, ctx: &OrchestrationContext, input: EmbeddingRequest) -> WorkflowOutput {
        let mut run = OrchestrationRun::new(ctx);
        let Some(input) = run.validate(input) else {
            return run.finish();
        };
        let (Some(source), Some(target)) =
            (input.source_blob_storage_info, input.target_blob_storage_info)
        else {
            return run.finish();
        };

        let text: Option<BlobContent> = run
            .step(READ_BLOB, READ_BLOB, ReadBlobRequest::new(source.clone()))
            .await;
        let Some(text) = text else {
            return run.finish();
        };
        run.note(READ_BLOB, format!("Read {} characters from '{}'.", text.content.len(), source));

        let embedding: Option<Embedding> = run
            .step(
                GENERATE_EMBEDDING,
                GENERATE_EMBEDDING,
                GenerateEmbeddingRequest::new(text.content, &input.model),
            )
            .await;
        let Some(embedding) = embedding else {
            return run.finish();
        };
        run.note(
            GENERATE_EMBEDDING,
            format!(
                "Generated a {}-dimension embedding with '{}'.",
                embedding.dimensions(),
                input.model
            ),
        );

        let content = match serde_json::to_string(&embedding.vector) {
            Ok(content) => content,
            Err(e) => {
                run.terminate(GENERATE_EMBEDDING, format!("embedding could not be encoded: {}", e));
                return run.finish();
            }
        };

        let written: Option<BlobWriteResponse> = run
            .step(WRITE_BLOB, WRITE_BLOB, WriteBlobRequest::new(target.clone(), content))
            .await;
        if written.is_none() {
            return run.finish();
        }

        run.complete(format!("Embedding of '{}' written to blob '{}'.", source, target));
        run.finish()
    }
}
