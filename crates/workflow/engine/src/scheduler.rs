//! Activity scheduling and replay history
//!
//! Orchestrations never call activities directly. They emit an
//! [`ActivityCall`] descriptor to an [`ActivityScheduler`], which resolves and
//! runs it and records the outcome. Replaying an orchestration against a
//! recorded history answers every already-completed call from the history
//! instead of executing it again.

use crate::error::panic_message;
use crate::registry::ActivityRegistry;
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use workflow_types::ActivityError;

/// Call descriptor: which capability to run with which payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCall {
    /// Position of the call in the orchestration, assigned in program order
    pub sequence: u64,
    pub capability: String,
    pub payload: Value,
}

/// Outcome of one scheduled call. Awaiting it is the suspension point.
pub type ActivityHandle = BoxFuture<'static, Result<Value, ActivityError>>;

/// Resolves and runs activity calls on behalf of orchestrations
pub trait ActivityScheduler: Send + Sync {
    /// Start `call`. Work begins before the returned handle is polled.
    fn schedule(&self, call: ActivityCall) -> ActivityHandle;
}

/// Append-only record of activity calls and their outcomes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HistoryEvent {
    ActivityScheduled {
        sequence: u64,
        capability: String,
        payload: Value,
    },
    ActivityCompleted {
        sequence: u64,
        result: Value,
    },
    ActivityFailed {
        sequence: u64,
        error: ActivityError,
    },
}

impl HistoryEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            Self::ActivityScheduled { sequence, .. }
            | Self::ActivityCompleted { sequence, .. }
            | Self::ActivityFailed { sequence, .. } => *sequence,
        }
    }
}

// ── Replay Index ─────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct RecordedCall {
    capability: String,
    outcome: Option<Result<Value, ActivityError>>,
}

fn index_history(history: &[HistoryEvent]) -> BTreeMap<u64, RecordedCall> {
    let mut recorded = BTreeMap::new();
    for event in history {
        match event {
            HistoryEvent::ActivityScheduled {
                sequence,
                capability,
                ..
            } => {
                recorded.insert(
                    *sequence,
                    RecordedCall {
                        capability: capability.clone(),
                        outcome: None,
                    },
                );
            }
            HistoryEvent::ActivityCompleted { sequence, result } => {
                if let Some(call) = recorded.get_mut(sequence) {
                    call.outcome = Some(Ok(result.clone()));
                }
            }
            HistoryEvent::ActivityFailed { sequence, error } => {
                if let Some(call) = recorded.get_mut(sequence) {
                    call.outcome = Some(Err(error.clone()));
                }
            }
        }
    }
    recorded
}

// ── In-Memory Scheduler ──────────────────────────────────────────────

/// Scheduler that runs activities in-process on tokio tasks.
///
/// Every call gets its own task, so calls scheduled back to back run
/// concurrently. A call whose sequence already has a recorded outcome is
/// answered from the recording and never executed.
pub struct InMemoryScheduler {
    registry: Arc<ActivityRegistry>,
    recorded: BTreeMap<u64, RecordedCall>,
    history: Arc<Mutex<Vec<HistoryEvent>>>,
    executed: Mutex<Vec<ActivityCall>>,
}

impl InMemoryScheduler {
    pub fn new(registry: Arc<ActivityRegistry>) -> Self {
        Self::replaying(registry, Vec::new())
    }

    /// Scheduler that answers from `history` where it can
    pub fn replaying(registry: Arc<ActivityRegistry>, history: Vec<HistoryEvent>) -> Self {
        Self {
            registry,
            recorded: index_history(&history),
            history: Arc::new(Mutex::new(Vec::new())),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// History recorded by this scheduler, replayed calls included
    pub fn history(&self) -> Vec<HistoryEvent> {
        self.history.lock().clone()
    }

    /// Calls that actually reached an activity
    pub fn executed_calls(&self) -> Vec<ActivityCall> {
        self.executed.lock().clone()
    }

    /// Number of calls answered from the recorded history
    pub fn replayed_count(&self) -> usize {
        let executed = self.executed.lock().len();
        let scheduled = self
            .history
            .lock()
            .iter()
            .filter(|e| matches!(e, HistoryEvent::ActivityScheduled { .. }))
            .count();
        scheduled - executed
    }

    fn record_scheduled(&self, call: &ActivityCall) {
        self.history.lock().push(HistoryEvent::ActivityScheduled {
            sequence: call.sequence,
            capability: call.capability.clone(),
            payload: call.payload.clone(),
        });
    }

    fn execute(&self, call: ActivityCall) -> ActivityHandle {
        self.executed.lock().push(call.clone());

        let registry = Arc::clone(&self.registry);
        let history = Arc::clone(&self.history);
        let sequence = call.sequence;
        let capability = call.capability.clone();
        let work = {
            let history = Arc::clone(&history);
            async move {
                let outcome = registry.execute(&call).await;
                history.lock().push(completion_event(call.sequence, &outcome));
                outcome
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let task = runtime.spawn(work);
                async move {
                    match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            // Aborted calls enter the history like any other failure
                            let outcome = Err(ActivityError::Aborted {
                                capability,
                                message: abort_message(e),
                            });
                            history.lock().push(completion_event(sequence, &outcome));
                            outcome
                        }
                    }
                }
                .boxed()
            }
            // Outside a runtime the call runs when the handle is first polled
            Err(_) => work.boxed(),
        }
    }
}

impl ActivityScheduler for InMemoryScheduler {
    fn schedule(&self, call: ActivityCall) -> ActivityHandle {
        self.record_scheduled(&call);

        let Some(recorded) = self.recorded.get(&call.sequence) else {
            tracing::debug!(
                capability = %call.capability,
                sequence = call.sequence,
                "Scheduling activity"
            );
            return self.execute(call);
        };

        if recorded.capability != call.capability {
            let error = ActivityError::Nondeterministic {
                sequence: call.sequence,
                recorded: recorded.capability.clone(),
                scheduled: call.capability.clone(),
            };
            tracing::error!(error = %error, "Replay diverged from history");
            let outcome = Err(error);
            self.history
                .lock()
                .push(completion_event(call.sequence, &outcome));
            return future::ready(outcome).boxed();
        }

        match &recorded.outcome {
            Some(outcome) => {
                tracing::debug!(
                    capability = %call.capability,
                    sequence = call.sequence,
                    "Replaying recorded outcome"
                );
                self.history
                    .lock()
                    .push(completion_event(call.sequence, outcome));
                future::ready(outcome.clone()).boxed()
            }
            // Scheduled but never completed: run it again
            None => self.execute(call),
        }
    }
}

fn completion_event(sequence: u64, outcome: &Result<Value, ActivityError>) -> HistoryEvent {
    match outcome {
        Ok(result) => HistoryEvent::ActivityCompleted {
            sequence,
            result: result.clone(),
        },
        Err(error) => HistoryEvent::ActivityFailed {
            sequence,
            error: error.clone(),
        },
    }
}

/// Message for a call whose task never returned.
///
/// Built from the panic payload alone so that it does not vary with the
/// runtime's task ids.
fn abort_message(error: tokio::task::JoinError) -> String {
    if error.is_panic() {
        panic_message(error.into_panic().as_ref())
    } else {
        "activity task was cancelled".to_string()
    }
}
