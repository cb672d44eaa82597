//! Copy a secret's value into a blob

use super::Workflow;
use crate::capabilities::{GET_SECRET, WRITE_BLOB};
use crate::context::OrchestrationContext;
use crate::sequencer::OrchestrationRun;
use async_trait::async_trait;
use workflow_types::{
    BlobWriteResponse, GetSecretRequest, SecretToBlobRequest, SecretValue, WorkflowOutput,
    WriteBlobRequest,
};

/// `GetSecret` then `WriteBlob`.
///
/// A secret that does not exist comes back as the not-found sentinel; the
/// sentinel is written like any other value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretToBlobWorkflow;

impl SecretToBlobWorkflow {
    pub const NAME: &'static str = "SecretToBlob";
}

#[async_trait]
impl Workflow for SecretToBlobWorkflow {
    type Input = SecretToBlobRequest;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(&self, ctx: &OrchestrationContext, input: SecretToBlobRequest) -> WorkflowOutput {
        let mut run = OrchestrationRun::new(ctx);
        let Some(input) = run.validate(input) else {
            return run.finish();
        };
        let Some(target) = input.target_blob_storage_info else {
            return run.finish();
        };

        let secret: Option<SecretValue> = run
            .step(GET_SECRET, GET_SECRET, GetSecretRequest::new(&input.name))
            .await;
        let Some(secret) = secret else {
            return run.finish();
        };

        if secret.is_not_found() {
            run.warn(
                GET_SECRET,
                format!(
                    "Secret '{}' was not found; writing the placeholder value.",
                    input.name
                ),
            );
        } else {
            run.note(GET_SECRET, format!("Retrieved secret '{}'.", input.name));
        }

        let written: Option<BlobWriteResponse> = run
            .step(WRITE_BLOB, WRITE_BLOB, WriteBlobRequest::new(target.clone(), secret.value))
            .await;
        let Some(written) = written else {
            return run.finish();
        };
        run.note(
            WRITE_BLOB,
            format!("Wrote {} bytes to '{}'.", written.bytes_written, written.blob_uri),
        );

        run.complete(format!("Secret '{}' written to blob '{}'.", input.name, target));
        run.finish()
    }
}
