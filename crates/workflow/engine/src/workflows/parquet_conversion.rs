//! Bulk conversion of a listing into Parquet, one batch per page

use super::Workflow;
use crate::capabilities::{CONVERT_TO_PARQUET, LIST_ITEMS};
use crate::config::EngineConfig;
use crate::context::OrchestrationContext;
use crate::pagination::fan_out_fan_in;
use crate::sequencer::OrchestrationRun;
use async_trait::async_trait;
use workflow_types::{ParquetConversionRequest, WorkflowOutput};

/// Step identifier of the aggregate verdict when a batch failed
pub const FAN_IN_STEP: &str = "FanIn";

/// Lists the source page by page and converts every page concurrently.
///
/// One batch failing never cancels the others. The run completes only when
/// every batch succeeded; otherwise it ends with a degraded verdict.
#[derive(Debug, Clone, Copy)]
pub struct ParquetConversionWorkflow {
    default_page_size: i64,
}

impl ParquetConversionWorkflow {
    pub const NAME: &'static str = "ParquetConversion";

    pub fn new(default_page_size: i64) -> Self {
        Self { default_page_size }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.pagination.default_page_size)
    }

    pub fn default_page_size(&self) -> i64 {
        self.default_page_size
    }
}

impl Default for ParquetConversionWorkflow {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[async_trait]
impl Workflow for ParquetConversionWorkflow {
    type Input = ParquetConversionRequest;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn run(
        &self,
        ctx: &OrchestrationContext,
        input: ParquetConversionRequest,
    ) -> WorkflowOutput {
        let mut run = OrchestrationRun::new(ctx);
        let Some(input) = run.validate(input) else {
            return run.finish();
        };
        let (Some(source), Some(destination)) = (input.source_location, input.destination_location)
        else {
            return run.finish();
        };
        let page_size = input.page_size.unwrap_or(self.default_page_size);

        let outcome = fan_out_fan_in(ctx, &source, &destination, page_size).await;

        for batch in &outcome.batches {
            match &batch.result {
                Ok(report) => run.note(
                    CONVERT_TO_PARQUET,
                    format!(
                        "Batch {} converted {} of {} item(s).",
                        batch.index + 1,
                        report.converted.len(),
                        batch.item_names.len()
                    ),
                ),
                Err(e) => run.record_error(
                    CONVERT_TO_PARQUET,
                    format!("Batch {} failed: {}", batch.index + 1, e),
                ),
            }
        }
        if let Some(e) = &outcome.listing_error {
            run.record_error(LIST_ITEMS, e.to_string());
        }

        if outcome.is_success() {
            run.complete(format!(
                "Converted {} item(s) in {} batch(es) from '{}' to '{}'.",
                outcome.converted_count(),
                outcome.batches.len(),
                source,
                destination
            ));
        } else if outcome.listing_error.is_some() {
            run.terminate(
                FAN_IN_STEP,
                format!(
                    "Degraded: listing stopped early, {} of {} batch(es) failed.",
                    outcome.failed_count(),
                    outcome.batches.len()
                ),
            );
        } else {
            run.terminate(
                FAN_IN_STEP,
                format!(
                    "Degraded: {} of {} batch(es) failed.",
                    outcome.failed_count(),
                    outcome.batches.len()
                ),
            );
        }
        run.finish()
    }
}
