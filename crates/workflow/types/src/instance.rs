//! Workflow instances: identifiers, lifecycle states and final output

use serde::{Deserialize, Serialize};

// ── Instance Identifier ──────────────────────────────────────────────

/// Unique identifier for a started orchestration
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Step Sequencing State ────────────────────────────────────────────

/// Position of one orchestration run in the step state machine
///
/// `Start → Validating → {TerminatedWithErrors | Invoking}`,
/// `Invoking → {Completed | TerminatedWithErrors}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    #[default]
    Start,
    Validating,
    Invoking,
    Completed,
    TerminatedWithErrors,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::TerminatedWithErrors)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Validating => write!(f, "validating"),
            Self::Invoking => write!(f, "invoking"),
            Self::Completed => write!(f, "completed"),
            Self::TerminatedWithErrors => write!(f, "terminated-with-errors"),
        }
    }
}

// ── Instance Lifecycle ───────────────────────────────────────────────

/// Host-side lifecycle of a started instance
///
/// `Completed` means the orchestrator returned, whatever its `RunState`.
/// `Failed` means the orchestration task itself did not return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceState {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What an orchestrator hands back to its caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutput {
    pub workflow: String,
    pub instance_id: InstanceId,
    pub state: RunState,
    /// Rendered `"step::message"` list, in execution order
    pub results: Vec<String>,
}

impl WorkflowOutput {
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn last_result(&self) -> Option<&str> {
        self.results.last().map(String::as_str)
    }
}

/// Answer to a status query
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStatus {
    pub state: InstanceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<WorkflowOutput>,
    /// Why the orchestration task did not return; set only for `Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}
