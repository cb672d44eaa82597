//! Activity registry: resolves capability names to activities
//!
//! The registry is the activity side of the invocation contract. Each
//! execution continues the trace carried in the payload with a consumer span.

use crate::activity::{Activity, ActivityContext, Capability, CapabilityActivity, FnActivity};
use crate::scheduler::ActivityCall;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use workflow_observability::{extract, SpanKind, Tracer};
use workflow_types::{ActivityError, ObservabilityProperties};

/// Registry of activities, keyed by capability name
pub struct ActivityRegistry {
    activities: BTreeMap<String, Arc<dyn Activity>>,
    tracer: Tracer,
}

impl ActivityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::with_tracer(Tracer::new("activities"))
    }

    pub fn with_tracer(tracer: Tracer) -> Self {
        Self {
            activities: BTreeMap::new(),
            tracer,
        }
    }

    /// Register an activity under its own name, replacing any previous one
    pub fn register<A: Activity + 'static>(&mut self, activity: A) -> &mut Self {
        let name = activity.name().to_string();
        if self.activities.insert(name.clone(), Arc::new(activity)).is_some() {
            tracing::warn!(capability = %name, "Activity replaced");
        } else {
            tracing::debug!(capability = %name, "Activity registered");
        }
        self
    }

    pub fn register_capability<C: Capability>(&mut self, capability: C) -> &mut Self {
        self.register(CapabilityActivity(capability))
    }

    /// Register a plain async closure as `name`
    pub fn register_fn<Req, Resp, F, Fut>(&mut self, name: &str, handler: F) -> &mut Self
    where
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, ActivityError>> + Send + 'static,
    {
        self.register(FnActivity::new(name, handler))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Activity>> {
        self.activities.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.activities.contains_key(name)
    }

    /// Registered capability names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.activities.keys().map(String::as_str).collect()
    }

    pub fn count(&self) -> usize {
        self.activities.len()
    }

    /// Run `call` against its activity.
    ///
    /// The payload's trace context becomes the parent of the consumer span.
    pub async fn execute(&self, call: &ActivityCall) -> Result<Value, ActivityError> {
        let activity = self
            .get(&call.capability)
            .ok_or_else(|| ActivityError::not_registered(&call.capability))?;

        let properties = ObservabilityProperties::from_payload(&call.payload);
        let parent = extract(&properties);
        let mut span = self
            .tracer
            .start_child(call.capability.as_str(), SpanKind::Consumer, &parent);
        span.set_attribute("activity.sequence", call.sequence);
        span.set_attribute("activity.remote_parent", parent.is_valid());
        span.tag_from_properties(&properties);

        let ctx = ActivityContext {
            capability: call.capability.clone(),
            sequence: call.sequence,
            trace: span.context.clone(),
        };

        let outcome = activity.run(ctx, call.payload.clone()).await;
        match &outcome {
            Ok(_) => tracing::debug!(
                capability = %call.capability,
                sequence = call.sequence,
                "Activity completed"
            ),
            Err(e) => {
                tracing::warn!(
                    capability = %call.capability,
                    sequence = call.sequence,
                    error = %e,
                    "Activity failed"
                );
                span.set_error(e.to_string());
                span.record_exception(e);
            }
        }
        self.tracer.finish(span);
        outcome
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
