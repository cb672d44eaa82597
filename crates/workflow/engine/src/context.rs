//! Orchestration context and the activity invocation wrapper
//!
//! Every activity call an orchestration makes goes through
//! [`OrchestrationContext::schedule`]:
//!
//! 1. Validate the request. An invalid request is never scheduled.
//! 2. Take the next sequence number.
//! 3. Open a client span whose context is derived from the orchestration's
//!    trace context and the sequence number.
//! 4. Tag the span from the request's observability properties.
//! 5. Inject the span's context into the request.
//! 6. Serialize the request and hand the call to the scheduler.
//!
//! Awaiting [`PendingActivity::outcome`] classifies the result and closes
//! the span.
//!
//! Nothing here reads the clock or draws random numbers, so an orchestration
//! replayed against the same history issues byte-identical calls.

use crate::error::InvocationError;
use crate::scheduler::{ActivityCall, ActivityHandle, ActivityScheduler};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use workflow_observability::{
    inject, ActivitySpan, SpanKind, SpanValue, TraceContext, Tracer, BAGGAGE, TRACEPARENT,
    TRACESTATE,
};
use workflow_types::{ActivityResponse, InstanceId, ObservabilityProperties, WorkflowRequest};

/// Span event recorded when an activity returns a soft-failure sentinel
pub const SOFT_FAILURE_EVENT: &str = "soft_failure";

/// Per-instance state an orchestration body runs against
pub struct OrchestrationContext {
    instance_id: InstanceId,
    workflow: String,
    scheduler: Arc<dyn ActivityScheduler>,
    tracer: Tracer,
    trace: TraceContext,
    /// Non-trace properties of the workflow input, copied into every request
    properties: ObservabilityProperties,
    sequence: AtomicU64,
}

impl OrchestrationContext {
    pub fn new(
        instance_id: InstanceId,
        workflow: impl Into<String>,
        scheduler: Arc<dyn ActivityScheduler>,
        tracer: Tracer,
        trace: TraceContext,
    ) -> Self {
        Self {
            instance_id,
            workflow: workflow.into(),
            scheduler,
            tracer,
            trace,
            properties: ObservabilityProperties::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Properties to forward to every activity request; trace keys are dropped
    pub fn with_properties(mut self, properties: &ObservabilityProperties) -> Self {
        self.properties = properties
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), TRACEPARENT | TRACESTATE | BAGGAGE))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    /// Number of calls issued so far
    pub fn calls_issued(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Validate `request`, then schedule it against `capability`.
    ///
    /// The call is running once this returns; await the handle to observe
    /// its outcome.
    pub fn schedule<Req, Resp>(
        &self,
        capability: &str,
        mut request: Req,
    ) -> Result<PendingActivity<Resp>, InvocationError>
    where
        Req: WorkflowRequest + Serialize,
        Resp: DeserializeOwned + ActivityResponse,
    {
        let verdict = request.validate();
        if !verdict.is_valid() {
            tracing::warn!(
                workflow = %self.workflow,
                instance_id = %self.instance_id,
                capability,
                details = %verdict,
                "Activity request rejected"
            );
            return Err(InvocationError::InvalidRequest {
                capability: capability.to_string(),
                details: verdict.render(),
            });
        }

        let sequence = self.next_sequence();
        let span_context = self.trace.child_for_sequence(sequence);

        let properties = request.observability_properties_mut();
        for (key, value) in self.properties.iter() {
            if !properties.contains_key(key) {
                properties.insert(key.clone(), value.clone());
            }
        }

        let mut span = self
            .tracer
            .start_span(capability, SpanKind::Client, span_context.clone());
        span.set_attribute("workflow.name", self.workflow.as_str());
        span.set_attribute("workflow.instance_id", self.instance_id.as_str());
        span.set_attribute("activity.sequence", sequence);
        span.tag_from_properties(request.observability_properties());

        inject(request.observability_properties_mut(), &span_context);

        let payload = match serde_json::to_value(&request) {
            Ok(payload) => payload,
            Err(source) => {
                let error = InvocationError::Encode {
                    capability: capability.to_string(),
                    source,
                };
                span.set_error(error.to_string());
                span.record_exception(&error);
                self.tracer.finish(span);
                return Err(error);
            }
        };

        tracing::debug!(
            workflow = %self.workflow,
            instance_id = %self.instance_id,
            capability,
            sequence,
            "Activity scheduled"
        );

        let handle = self.scheduler.schedule(ActivityCall {
            sequence,
            capability: capability.to_string(),
            payload,
        });

        Ok(PendingActivity {
            capability: capability.to_string(),
            sequence,
            handle,
            span,
            tracer: self.tracer.clone(),
            _response: PhantomData,
        })
    }

    /// Schedule `request` and wait for its outcome
    pub async fn invoke<Req, Resp>(
        &self,
        capability: &str,
        request: Req,
    ) -> Result<Resp, InvocationError>
    where
        Req: WorkflowRequest + Serialize,
        Resp: DeserializeOwned + ActivityResponse,
    {
        self.schedule(capability, request)?.outcome().await
    }
}

impl std::fmt::Debug for OrchestrationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationContext")
            .field("instance_id", &self.instance_id)
            .field("workflow", &self.workflow)
            .field("calls_issued", &self.calls_issued())
            .finish_non_exhaustive()
    }
}

/// A scheduled activity call that has not been observed yet
#[must_use = "a scheduled activity must be awaited"]
pub struct PendingActivity<Resp> {
    capability: String,
    sequence: u64,
    handle: ActivityHandle,
    span: ActivitySpan,
    tracer: Tracer,
    _response: PhantomData<fn() -> Resp>,
}

impl<Resp> PendingActivity<Resp>
where
    Resp: DeserializeOwned + ActivityResponse,
{
    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wait for the call and classify its result.
    ///
    /// A null result is [`InvocationError::EmptyResult`]. A soft-failure
    /// sentinel is returned as a success and noted on the span.
    pub async fn outcome(self) -> Result<Resp, InvocationError> {
        let Self {
            capability,
            sequence,
            handle,
            mut span,
            tracer,
            ..
        } = self;

        let outcome = match handle.await {
            Err(source) => Err(InvocationError::Activity {
                capability: capability.clone(),
                source,
            }),
            Ok(Value::Null) => Err(InvocationError::EmptyResult {
                capability: capability.clone(),
            }),
            Ok(value) => serde_json::from_value::<Resp>(value).map_err(|source| {
                InvocationError::Decode {
                    capability: capability.clone(),
                    source,
                }
            }),
        };

        match &outcome {
            Ok(response) => {
                if let Some(failure) = response.soft_failure() {
                    tracing::warn!(
                        capability = %capability,
                        sequence,
                        failure,
                        "Activity returned a soft failure"
                    );
                    span.set_attribute("activity.soft_failure", failure);
                    span.add_event_with_attributes(
                        SOFT_FAILURE_EVENT,
                        BTreeMap::from([("name".to_string(), SpanValue::from(failure))]),
                    );
                }
            }
            Err(error) => {
                tracing::warn!(
                    capability = %capability,
                    sequence,
                    error = %error,
                    "Activity invocation failed"
                );
                span.set_error(error.to_string());
                span.record_exception(error);
            }
        }

        tracer.finish(span);
        outcome
    }
}
