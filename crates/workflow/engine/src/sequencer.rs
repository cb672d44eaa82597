//! Step sequencing state machine
//!
//! An [`OrchestrationRun`] carries one orchestration from `Start` through
//! `Validating` and `Invoking` to a terminal state, writing every outcome
//! into the run's [`WorkflowResult`]. Hard failures, empty results and
//! invalid input terminate the run on the spot; the caller sees a result
//! list that ends at the first error.

use crate::context::OrchestrationContext;
use serde::{de::DeserializeOwned, Serialize};
use workflow_types::{
    ActivityResponse, RunState, Severity, Validate, WorkflowOutput, WorkflowRequest,
    WorkflowResult,
};

/// Step identifier for request validation
pub const VALIDATE_STEP: &str = "ValidateRequest";

/// One execution of an orchestration body
pub struct OrchestrationRun<'a> {
    ctx: &'a OrchestrationContext,
    state: RunState,
    result: WorkflowResult,
}

impl<'a> OrchestrationRun<'a> {
    pub fn new(ctx: &'a OrchestrationContext) -> Self {
        Self {
            ctx,
            state: RunState::Start,
            result: WorkflowResult::new(ctx.workflow()),
        }
    }

    pub fn ctx(&self) -> &'a OrchestrationContext {
        self.ctx
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn result(&self) -> &WorkflowResult {
        &self.result
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }

    // ── Validating ───────────────────────────────────────────────────

    /// Validate the workflow input.
    ///
    /// Returns the input when it is valid. Otherwise every error message is
    /// recorded under [`VALIDATE_STEP`] and the run terminates.
    pub fn validate<R: Validate>(&mut self, request: R) -> Option<R> {
        self.state = RunState::Validating;
        let verdict = request.validate();

        if verdict.is_valid() {
            if !verdict.is_empty() {
                tracing::debug!(
                    workflow = %self.ctx.workflow(),
                    notes = %verdict,
                    "Request valid with notes"
                );
            }
            self.state = RunState::Invoking;
            return Some(request);
        }

        let errors: Vec<String> = verdict.errors().map(|m| m.text.clone()).collect();
        self.result.add_range(
            VALIDATE_STEP,
            "Request validation failed",
            errors,
            Severity::Error,
        );
        self.state = RunState::TerminatedWithErrors;
        None
    }

    /// Terminate before any step because the input could not be read
    pub fn reject(&mut self, message: impl Into<String>) {
        self.state = RunState::Validating;
        self.terminate(VALIDATE_STEP, message);
    }

    // ── Invoking ─────────────────────────────────────────────────────

    /// Invoke `capability` as step `step`.
    ///
    /// Returns the response when the call succeeded with a non-empty result.
    /// A failed or empty call is recorded and terminates the run. Calling
    /// this on a terminated run schedules nothing.
    pub async fn step<Req, Resp>(
        &mut self,
        step: &str,
        capability: &str,
        request: Req,
    ) -> Option<Resp>
    where
        Req: WorkflowRequest + Serialize,
        Resp: DeserializeOwned + ActivityResponse,
    {
        if self.state != RunState::Invoking {
            tracing::debug!(
                workflow = %self.ctx.workflow(),
                step,
                state = %self.state,
                "Step skipped"
            );
            return None;
        }

        match self.ctx.invoke::<Req, Resp>(capability, request).await {
            Ok(response) if response.is_empty() => {
                self.terminate(step, format!("{} returned an empty result.", capability));
                None
            }
            Ok(response) => Some(response),
            Err(e) => {
                self.terminate(step, e.to_string());
                None
            }
        }
    }

    /// Record an informational entry
    pub fn note(&mut self, step: &str, message: impl Into<String>) {
        self.result.add(step, message);
    }

    /// Record a warning without changing state
    pub fn warn(&mut self, step: &str, message: impl Into<String>) {
        self.result.add_with_severity(step, message, Severity::Warning);
    }

    /// Record an error without changing state
    pub fn record_error(&mut self, step: &str, message: impl Into<String>) {
        self.result.add_with_severity(step, message, Severity::Error);
    }

    // ── Terminal States ──────────────────────────────────────────────

    /// Record the completion entry under the workflow's own name
    pub fn complete(&mut self, message: impl Into<String>) {
        let step = self.ctx.workflow().to_string();
        self.result.add(step, message);
        self.state = RunState::Completed;
        tracing::info!(
            workflow = %self.ctx.workflow(),
            instance_id = %self.ctx.instance_id(),
            "Workflow completed"
        );
    }

    /// Record `message` as an error under `step` and stop
    pub fn terminate(&mut self, step: &str, message: impl Into<String>) {
        self.result.add_with_severity(step, message, Severity::Error);
        self.state = RunState::TerminatedWithErrors;
        tracing::warn!(
            workflow = %self.ctx.workflow(),
            instance_id = %self.ctx.instance_id(),
            step,
            "Workflow terminated with errors"
        );
    }

    /// Close the run and hand back the caller-visible output
    pub fn finish(self) -> WorkflowOutput {
        // A body that returns without reaching a terminal state did not complete
        let state = if self.state.is_terminal() {
            self.state
        } else {
            RunState::TerminatedWithErrors
        };
        WorkflowOutput {
            workflow: self.ctx.workflow().to_string(),
            instance_id: self.ctx.instance_id().clone(),
            state,
            results: self.result.into_results(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ActivityRegistry;
    use crate::scheduler::InMemoryScheduler;
    use std::sync::Arc;
    use workflow_observability::{TraceContext, Tracer};
    use workflow_types::{
        ActivityError, BlobContent, BlobStorageInfo, InstanceId, ReadBlobRequest,
        SecretToBlobRequest,
    };

    fn make_context(registry: ActivityRegistry) -> (OrchestrationContext, Arc<InMemoryScheduler>) {
        let scheduler = Arc::new(InMemoryScheduler::new(Arc::new(registry)));
        let ctx = OrchestrationContext::new(
            InstanceId::new("i-1"),
            "Embedding",
            scheduler.clone(),
            Tracer::new("orchestrator"),
            TraceContext::empty(),
        );
        (ctx, scheduler)
    }

    fn make_registry(content: &'static str) -> ActivityRegistry {
        let mut registry = ActivityRegistry::new();
        registry.register_fn("ReadBlob", move |_: ReadBlobRequest| async move {
            if content == "fail" {
                Err(ActivityError::failed("ReadBlob", "blob not found"))
            } else {
                Ok(BlobContent {
                    content: content.to_string(),
                })
            }
        });
        registry
    }

    fn read_request() -> ReadBlobRequest {
        ReadBlobRequest::new(BlobStorageInfo::new("docs", "a.txt"))
    }

    #[test]
    fn test_invalid_input_terminates() {
        let (ctx, _) = make_context(ActivityRegistry::new());
        let mut run = OrchestrationRun::new(&ctx);

        let input = SecretToBlobRequest::default();
        assert!(run.validate(input).is_none());
        assert_eq!(run.state(), RunState::TerminatedWithErrors);

        let output = run.finish();
        assert_eq!(
            output.results,
            vec![
                "ValidateRequest::secret name is missing.".to_string(),
                "ValidateRequest::target blob storage info is missing.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_step_success_then_complete() {
        let (ctx, _) = make_context(make_registry("hello"));
        let mut run = OrchestrationRun::new(&ctx);
        run.validate(read_request()).unwrap();

        let content: BlobContent = run.step("ReadBlob", "ReadBlob", read_request()).await.unwrap();
        run.note("ReadBlob", format!("Read {} characters.", content.content.len()));
        run.complete("Done.");

        let output = run.finish();
        assert!(output.is_completed());
        assert_eq!(output.results, vec!["ReadBlob::Read 5 characters.", "Embedding::Done."]);
    }

    #[tokio::test]
    async fn test_empty_result_terminates() {
        let (ctx, scheduler) = make_context(make_registry(""));
        let mut run = OrchestrationRun::new(&ctx);
        run.validate(read_request()).unwrap();

        let content: Option<BlobContent> = run.step("ReadBlob", "ReadBlob", read_request()).await;
        assert!(content.is_none());
        assert_eq!(run.state(), RunState::TerminatedWithErrors);

        // Nothing runs after termination
        let again: Option<BlobContent> = run.step("ReadBlob", "ReadBlob", read_request()).await;
        assert!(again.is_none());
        assert_eq!(scheduler.executed_calls().len(), 1);

        let output = run.finish();
        assert_eq!(output.last_result(), Some("ReadBlob::ReadBlob returned an empty result."));
    }

    #[tokio::test]
    async fn test_hard_failure_terminates() {
        let (ctx, _) = make_context(make_registry("fail"));
        let mut run = OrchestrationRun::new(&ctx);
        run.validate(read_request()).unwrap();

        let content: Option<BlobContent> = run.step("ReadBlob", "ReadBlob", read_request()).await;
        assert!(content.is_none());
        let output = run.finish();
        assert_eq!(output.state, RunState::TerminatedWithErrors);
        assert_eq!(output.results, vec!["ReadBlob::ReadBlob failed: blob not found"]);
    }

    #[test]
    fn test_reject_and_unfinished_body() {
        let (ctx, _) = make_context(ActivityRegistry::new());
        let mut run = OrchestrationRun::new(&ctx);
        run.reject("request could not be decoded: expected a string");
        assert_eq!(
            run.finish().results,
            vec!["ValidateRequest::request could not be decoded: expected a string"]
        );

        let mut run = OrchestrationRun::new(&ctx);
        run.validate(read_request()).unwrap();
        assert_eq!(run.finish().state, RunState::TerminatedWithErrors);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn echo_registry() -> ActivityRegistry {
            let mut registry = ActivityRegistry::new();
            registry.register_fn("ReadBlob", |req: ReadBlobRequest| async move {
                if req.source.blob_name == "bad" {
                    Err(ActivityError::failed("ReadBlob", "boom"))
                } else {
                    Ok(BlobContent {
                        content: req.source.blob_name,
                    })
                }
            });
            registry
        }

        proptest! {
            #[test]
            fn prop_run_stops_at_first_failure(
                outcomes in proptest::collection::vec(any::<bool>(), 1..8)
            ) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();

                runtime.block_on(async {
                    let (ctx, scheduler) = make_context(echo_registry());
                    let mut run = OrchestrationRun::new(&ctx);
                    run.validate(read_request()).unwrap();

                    for ok in &outcomes {
                        let name = if *ok { "good" } else { "bad" };
                        let request = ReadBlobRequest::new(BlobStorageInfo::new("docs", name));
                        let content: Option<BlobContent> =
                            run.step("ReadBlob", "ReadBlob", request).await;
                        if content.is_some() {
                            run.note("ReadBlob", "ok");
                        }
                    }
                    if !run.is_terminated() {
                        run.complete("Done.");
                    }

                    let first_failure = outcomes.iter().position(|ok| !ok);
                    let expected_calls = first_failure.map_or(outcomes.len(), |i| i + 1);
                    prop_assert_eq!(scheduler.executed_calls().len(), expected_calls);

                    let output = run.finish();
                    // One note per success, then either the error or the completion entry
                    let expected_entries = first_failure.map_or(outcomes.len() + 1, |i| i + 1);
                    prop_assert_eq!(output.results.len(), expected_entries);
                    match first_failure {
                        Some(_) => {
                            prop_assert_eq!(output.state, RunState::TerminatedWithErrors);
                            prop_assert_eq!(
                                output.last_result(),
                                Some("ReadBlob::ReadBlob failed: boom")
                            );
                        }
                        None => prop_assert_eq!(output.last_result(), Some("Embedding::Done.")),
                    }
                    Ok::<(), TestCaseError>(())
                })?;
            }
        }
    }
}
