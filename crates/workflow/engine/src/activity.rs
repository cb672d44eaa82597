//! Activity contract
//!
//! An activity performs exactly one external call. The scheduler hands it a
//! JSON payload; [`Capability`] is the typed form most implementations use.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use workflow_observability::TraceContext;
use workflow_types::ActivityError;

/// What an activity knows about the call it is serving
#[derive(Clone, Debug)]
pub struct ActivityContext {
    pub capability: String,
    pub sequence: u64,
    /// Context of the activity's own span
    pub trace: TraceContext,
}

/// Erased activity: JSON in, JSON out
#[async_trait]
pub trait Activity: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, ctx: ActivityContext, payload: Value) -> Result<Value, ActivityError>;
}

/// Typed activity
#[async_trait]
pub trait Capability: Send + Sync + 'static {
    type Request: DeserializeOwned + Send;
    type Response: Serialize + Send;

    fn name(&self) -> &str;

    async fn execute(
        &self,
        ctx: &ActivityContext,
        request: Self::Request,
    ) -> Result<Self::Response, ActivityError>;
}

/// Adapts a [`Capability`] to the erased [`Activity`] form
pub struct CapabilityActivity<C>(pub C);

#[async_trait]
impl<C: Capability> Activity for CapabilityActivity<C> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn run(&self, ctx: ActivityContext, payload: Value) -> Result<Value, ActivityError> {
        let request: C::Request = serde_json::from_value(payload)
            .map_err(|e| ActivityError::invalid_payload(self.0.name(), e.to_string()))?;
        let response = self.0.execute(&ctx, request).await?;
        encode_response(self.0.name(), &response)
    }
}

/// Activity backed by a plain async closure
pub struct FnActivity<Req, Resp, F> {
    name: String,
    handler: F,
    _marker: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp, F> FnActivity<Req, Resp, F> {
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<Req, Resp, F, Fut> Activity for FnActivity<Req, Resp, F>
where
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, ActivityError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: ActivityContext, payload: Value) -> Result<Value, ActivityError> {
        let request: Req = serde_json::from_value(payload)
            .map_err(|e| ActivityError::invalid_payload(&self.name, e.to_string()))?;
        let response = (self.handler)(request).await?;
        encode_response(&self.name, &response)
    }
}

fn encode_response<R: Serialize>(capability: &str, response: &R) -> Result<Value, ActivityError> {
    serde_json::to_value(response)
        .map_err(|e| ActivityError::failed(capability, format!("failed to encode response: {}", e)))
}
