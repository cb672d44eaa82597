//! Workflow host: start orchestrations and query their status
//!
//! The host owns the workflow catalog and one [`InMemoryScheduler`] per
//! instance, so every instance keeps its own activity history. A finished
//! instance can be replayed against that history without reaching any
//! activity.

use crate::config::EngineConfig;
use crate::error::{panic_message, HostError, HostResult};
use crate::registry::ActivityRegistry;
use crate::scheduler::{ActivityCall, ActivityScheduler, HistoryEvent, InMemoryScheduler};
use crate::workflows::{
    execute_workflow, BlobCopyWorkflow, DocumentAnalysisWorkflow, EmbeddingWorkflow,
    ErasedWorkflow, ParquetConversionWorkflow, SecretToBlobWorkflow,
};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use workflow_observability::Tracer;
use workflow_types::{InstanceId, InstanceState, InstanceStatus, WorkflowOutput};

struct InstanceRecord {
    workflow: String,
    input: Value,
    state: InstanceState,
    output: Option<WorkflowOutput>,
    failure: Option<String>,
    scheduler: Arc<InMemoryScheduler>,
    /// Settles the record itself, so it resolves to nothing
    task: Option<JoinHandle<()>>,
}

impl InstanceRecord {
    fn status(&self) -> InstanceStatus {
        InstanceStatus {
            state: self.state,
            output: self.output.clone(),
            failure: self.failure.clone(),
        }
    }

    fn settled(&self, instance_id: &InstanceId) -> Option<HostResult<WorkflowOutput>> {
        if let Some(output) = &self.output {
            return Some(Ok(output.clone()));
        }
        self.failure.as_ref().map(|message| {
            Err(HostError::Join {
                instance_id: instance_id.clone(),
                message: message.clone(),
            })
        })
    }

    fn fail(&mut self, message: String) {
        self.state = InstanceState::Failed;
        self.failure = Some(message);
    }
}

/// Result of replaying an instance against its recorded history
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub output: WorkflowOutput,
    /// Calls that had no recorded outcome and were executed again
    pub executed: Vec<ActivityCall>,
    /// Calls answered from history
    pub replayed: usize,
}

/// Runs registered workflows against an activity registry
pub struct WorkflowHost {
    workflows: RwLock<BTreeMap<String, Arc<dyn ErasedWorkflow>>>,
    registry: Arc<ActivityRegistry>,
    tracer: Tracer,
    instances: Arc<Mutex<BTreeMap<InstanceId, InstanceRecord>>>,
}

impl WorkflowHost {
    /// Create a host with no workflows registered
    pub fn new(registry: Arc<ActivityRegistry>) -> Self {
        Self::with_tracer(registry, Tracer::new("orchestrator"))
    }

    pub fn with_tracer(registry: Arc<ActivityRegistry>, tracer: Tracer) -> Self {
        Self {
            workflows: RwLock::new(BTreeMap::new()),
            registry,
            tracer,
            instances: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Create a host with the five built-in workflows registered
    pub fn with_builtin_workflows(registry: Arc<ActivityRegistry>, config: &EngineConfig) -> Self {
        let host = Self::new(registry);
        let builtin: [Arc<dyn ErasedWorkflow>; 5] = [
            Arc::new(SecretToBlobWorkflow),
            Arc::new(BlobCopyWorkflow),
            Arc::new(EmbeddingWorkflow),
            Arc::new(DocumentAnalysisWorkflow),
            Arc::new(ParquetConversionWorkflow::from_config(config)),
        ];
        {
            let mut workflows = host.workflows.write();
            for workflow in builtin {
                workflows.insert(workflow.name().to_string(), workflow);
            }
        }
        host
    }

    // ── Catalog ──────────────────────────────────────────────────────

    /// Register a workflow under its name
    pub fn register<W: ErasedWorkflow + 'static>(&self, workflow: W) -> HostResult<()> {
        let name = workflow.name();
        let mut workflows = self.workflows.write();
        if workflows.contains_key(name) {
            return Err(HostError::DuplicateWorkflow(name.to_string()));
        }
        workflows.insert(name.to_string(), Arc::new(workflow));
        tracing::debug!(workflow = name, "Workflow registered");
        Ok(())
    }

    /// Registered workflow names, sorted
    pub fn workflow_names(&self) -> Vec<String> {
        self.workflows.read().keys().cloned().collect()
    }

    pub fn registry(&self) -> &Arc<ActivityRegistry> {
        &self.registry
    }

    fn workflow(&self, name: &str) -> HostResult<Arc<dyn ErasedWorkflow>> {
        self.workflows
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::UnknownWorkflow(name.to_string()))
    }

    // ── Instance Lifecycle ───────────────────────────────────────────

    /// Start a new instance of `name`. The orchestration runs on its own task.
    pub fn start(&self, name: &str, input: Value) -> HostResult<InstanceId> {
        let workflow = self.workflow(name)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| HostError::NoRuntime)?;

        let instance_id = InstanceId::generate();
        let scheduler = Arc::new(InMemoryScheduler::new(Arc::clone(&self.registry)));

        let instances = Arc::clone(&self.instances);
        let tracer = self.tracer.clone();
        let id = instance_id.clone();
        let record_scheduler = Arc::clone(&scheduler);
        let run_input = input.clone();

        // Held across the spawn so no waiter sees the record without its task
        let mut guard = self.instances.lock();
        let task = runtime.spawn(async move {
            let scheduler: Arc<dyn ActivityScheduler> = scheduler;
            let run = execute_workflow(workflow.as_ref(), id.clone(), run_input, scheduler, tracer);
            let outcome = AssertUnwindSafe(run).catch_unwind().await;

            let mut instances = instances.lock();
            let Some(record) = instances.get_mut(&id) else {
                return;
            };
            match outcome {
                Ok(output) => {
                    record.state = InstanceState::Completed;
                    record.output = Some(output);
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(
                        instance_id = %id,
                        error = %message,
                        "Workflow instance failed"
                    );
                    record.fail(message);
                }
            }
        });
        guard.insert(
            instance_id.clone(),
            InstanceRecord {
                workflow: name.to_string(),
                input,
                state: InstanceState::Running,
                output: None,
                failure: None,
                scheduler: record_scheduler,
                task: Some(task),
            },
        );
        drop(guard);

        tracing::info!(
            workflow = name,
            instance_id = %instance_id,
            "Workflow instance started"
        );
        Ok(instance_id)
    }

    pub fn get_status(&self, instance_id: &InstanceId) -> HostResult<InstanceStatus> {
        let instances = self.instances.lock();
        let record = instances
            .get(instance_id)
            .ok_or_else(|| HostError::InstanceNotFound(instance_id.clone()))?;
        Ok(record.status())
    }

    /// Wait for a started instance to finish.
    ///
    /// Only one caller at a time can wait on a running instance; once the
    /// instance has settled any number of callers get its outcome
    /// immediately. An instance whose orchestration panicked yields
    /// [`HostError::Join`].
    pub async fn wait_for_completion(
        &self,
        instance_id: &InstanceId,
    ) -> HostResult<WorkflowOutput> {
        let task = {
            let mut instances = self.instances.lock();
            let record = instances
                .get_mut(instance_id)
                .ok_or_else(|| HostError::InstanceNotFound(instance_id.clone()))?;
            if let Some(settled) = record.settled(instance_id) {
                return settled;
            }
            record
                .task
                .take()
                .ok_or_else(|| HostError::NotAwaitable(instance_id.clone()))?
        };

        let joined = task.await;

        let mut instances = self.instances.lock();
        let record = instances
            .get_mut(instance_id)
            .ok_or_else(|| HostError::InstanceNotFound(instance_id.clone()))?;
        if joined.is_err() && record.state == InstanceState::Running {
            // Panics are caught inside the task, so only cancellation lands here
            tracing::error!(instance_id = %instance_id, "Workflow instance cancelled");
            record.fail("workflow task was cancelled".to_string());
        }
        record.settled(instance_id).unwrap_or_else(|| {
            Err(HostError::Join {
                instance_id: instance_id.clone(),
                message: "workflow task ended without an outcome".to_string(),
            })
        })
    }

    /// Start `name` and wait for its output
    pub async fn run(&self, name: &str, input: Value) -> HostResult<WorkflowOutput> {
        let instance_id = self.start(name, input)?;
        self.wait_for_completion(&instance_id).await
    }

    // ── History & Replay ─────────────────────────────────────────────

    /// Activity history recorded for an instance so far
    pub fn history(&self, instance_id: &InstanceId) -> HostResult<Vec<HistoryEvent>> {
        let instances = self.instances.lock();
        let record = instances
            .get(instance_id)
            .ok_or_else(|| HostError::InstanceNotFound(instance_id.clone()))?;
        Ok(record.scheduler.history())
    }

    /// Re-execute an instance's orchestration against its recorded history.
    ///
    /// Calls with a recorded outcome are answered from history. The stored
    /// output and history of the instance are left untouched.
    pub async fn replay(&self, instance_id: &InstanceId) -> HostResult<ReplayOutcome> {
        let (workflow_name, input, history) = {
            let instances = self.instances.lock();
            let record = instances
                .get(instance_id)
                .ok_or_else(|| HostError::InstanceNotFound(instance_id.clone()))?;
            (
                record.workflow.clone(),
                record.input.clone(),
                record.scheduler.history(),
            )
        };
        let workflow = self.workflow(&workflow_name)?;

        let scheduler = Arc::new(InMemoryScheduler::replaying(
            Arc::clone(&self.registry),
            history,
        ));
        let output = execute_workflow(
            workflow.as_ref(),
            instance_id.clone(),
            input,
            scheduler.clone(),
            self.tracer.clone(),
        )
        .await;

        let executed = scheduler.executed_calls();
        let replayed = scheduler.replayed_count();
        tracing::info!(
            workflow = %workflow_name,
            instance_id = %instance_id,
            replayed,
            executed = executed.len(),
            "Workflow instance replayed"
        );

        Ok(ReplayOutcome {
            output,
            executed,
            replayed,
        })
    }

    // ── Eviction ─────────────────────────────────────────────────────

    /// Drop a finished instance, returning its final status
    pub fn remove(&self, instance_id: &InstanceId) -> HostResult<InstanceStatus> {
        let mut instances = self.instances.lock();
        let record = instances
            .get(instance_id)
            .ok_or_else(|| HostError::InstanceNotFound(instance_id.clone()))?;
        if record.state == InstanceState::Running {
            return Err(HostError::StillRunning(instance_id.clone()));
        }
        let status = record.status();
        instances.remove(instance_id);
        tracing::debug!(instance_id = %instance_id, "Workflow instance removed");
        Ok(status)
    }

    /// Drop every finished instance. Returns how many were removed.
    pub fn purge_finished(&self) -> usize {
        let mut instances = self.instances.lock();
        let before = instances.len();
        instances.retain(|_, record| record.state == InstanceState::Running);
        before - instances.len()
    }

    /// Number of instances held by this host
    pub fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }
}
