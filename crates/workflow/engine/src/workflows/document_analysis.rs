use super::Workflow;
use crate::capabilities::{ANALYZE_DOCUMENT, WRITE_BLOB};
use crate::context::OrchestrationContext;
use crate::sequencer::OrchestrationRun;
use async_trait::async_trait;
use workflow_types::{
    AnalyzeDocumentRequest, BlobWriteResponse, DocumentAnalysis, DocumentAnalysisRequest,
    WorkflowOutput, WriteBlobRequest,
};

/// `AnalyzeDocument` then `WriteBlob` with the extracted content
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAnalysisWorkflow;

impl DocumentAnalysisWorkflow {
    pub const NAME: &'static str = "DocumentAnalysis";
}

#[async_trait]
impl Workflow for DocumentAnalysisWorkflow {
    type Input = DocumentAnalysisRequest;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        ctx: &OrchestrationContext,
        input: DocumentAnalysisRequest,
    ) -> WorkflowOutput {
        let mut run = OrchestrationRun::new(ctx);
        let Some(input) = run.validate(input) else {
            return run.finish();
        };
        let (Some(source), Some(target)) =
            (input.source_blob_storage_info, input.target_blob_storage_info)
        else {
            return run.finish();
        };

        let analysis: Option<DocumentAnalysis> = run
            .step(
                ANALYZE_DOCUMENT,
                ANALYZE_DOCUMENT,
                AnalyzeDocumentRequest::new(source.clone(), &input.model_id),
            )
            .await;
        let Some(analysis) = analysis else {
            return run.finish();
        };
        run.note(
            ANALYZE_DOCUMENT,
            format!(
                "Analyzed {} page(s) with '{}', {} field(s) extracted.",
                analysis.pages,
                input.model_id,
                analysis.key_value_pairs.len()
            ),
        );

        let written: Option<BlobWriteResponse> = run
            .step(WRITE_BLOB, WRITE_BLOB, WriteBlobRequest::new(target.clone(), analysis.content))
            .await;
        if written.is_none() {
            return run.finish();
        }

        run.complete(format!("Analysis of '{}' written to blob '{}'.", source, target));
        run.finish()
    }
}
