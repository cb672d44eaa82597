//! Workflow step results: the caller-visible output of every orchestration
//!
//! Entries are appended in execution order and never removed. Callers may
//! index the rendered list by position, so ordering is part of the contract.

use crate::Severity;
use serde::{Deserialize, Serialize};

/// Separator between the step identifier and the message in rendered entries
pub const STEP_SEPARATOR: &str = "::";

/// One recorded step outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub step: String,
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for ResultEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.step, STEP_SEPARATOR, self.message)
    }
}

/// Ordered, append-only step log owned by one orchestration run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    workflow: String,
    entries: Vec<ResultEntry>,
}

impl WorkflowResult {
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            entries: Vec::new(),
        }
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    /// Append an informational entry
    pub fn add(&mut self, step: impl Into<String>, message: impl Into<String>) {
        self.add_with_severity(step, message, Severity::Info);
    }

    /// Append one entry and log it at its severity
    pub fn add_with_severity(
        &mut self,
        step: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) {
        let entry = ResultEntry {
            step: step.into(),
            message: message.into(),
            severity,
        };
        log_line(&self.workflow, &entry.step, &entry.message, severity);
        self.entries.push(entry);
    }

    /// Append many entries under one step, logging only `summary`
    pub fn add_range<I, S>(
        &mut self,
        step: impl Into<String>,
        summary: impl Into<String>,
        messages: I,
        severity: Severity,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let step = step.into();
        let before = self.entries.len();
        self.entries
            .extend(messages.into_iter().map(|message| ResultEntry {
                step: step.clone(),
                message: message.into(),
                severity,
            }));

        let summary = format!(
            "{} ({} entries)",
            summary.into(),
            self.entries.len() - before
        );
        log_line(&self.workflow, &step, &summary, severity);
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ResultEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.severity.is_error())
    }

    /// Render entries as `"step::message"` strings
    pub fn results(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Consume the log, yielding the rendered list
    pub fn into_results(self) -> Vec<String> {
        self.entries.into_iter().map(|e| e.to_string()).collect()
    }
}

fn log_line(workflow: &str, step: &str, message: &str, severity: Severity) {
    match severity {
        Severity::Debug => tracing::debug!(workflow, step, "{}", message),
        Severity::Info => tracing::info!(workflow, step, "{}", message),
        Severity::Warning => tracing::warn!(workflow, step, "{}", message),
        Severity::Error => tracing::error!(workflow, step, "{}", message),
    }
}
