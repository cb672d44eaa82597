//! Activity span types

use super::context::TraceContext;
use super::propagation::{BAGGAGE, TRACEPARENT, TRACESTATE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{span, Level};
use workflow_types::ObservabilityProperties;

/// Attribute prefix for values copied from request properties
pub const PROPERTY_ATTRIBUTE_PREFIX: &str = "observability.";

/// Event name used by [`ActivitySpan::record_exception`]
pub const EXCEPTION_EVENT: &str = "exception";

/// One traced unit of work: an activity call or its execution
#[derive(Debug, Clone)]
pub struct ActivitySpan {
    /// Span name/operation
    pub name: String,

    /// Component that opened the span
    pub component: String,

    /// Span kind
    pub kind: SpanKind,

    /// Start time
    pub start_time: DateTime<Utc>,

    /// End time (when span is finished)
    pub end_time: Option<DateTime<Utc>>,

    /// Trace position of this span
    pub context: TraceContext,

    /// Span status
    pub status: SpanStatus,

    /// Span attributes
    pub attributes: BTreeMap<String, SpanValue>,

    /// Events recorded during span
    pub events: Vec<SpanEvent>,
}

impl ActivitySpan {
    pub fn new(
        name: impl Into<String>,
        component: impl Into<String>,
        kind: SpanKind,
        context: TraceContext,
    ) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            kind,
            start_time: Utc::now(),
            end_time: None,
            context,
            status: SpanStatus::Unset,
            attributes: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Get duration if span is finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<SpanValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Copy request properties onto the span as `observability.<key>` attributes.
    ///
    /// Propagation keys are skipped; they are already reflected in the
    /// span's own context.
    pub fn tag_from_properties(&mut self, properties: &ObservabilityProperties) {
        for (key, value) in properties.iter() {
            if matches!(key.as_str(), TRACEPARENT | TRACESTATE | BAGGAGE) {
                continue;
            }
            self.attributes.insert(
                format!("{}{}", PROPERTY_ATTRIBUTE_PREFIX, key),
                SpanValue::from(value),
            );
        }
    }

    /// Add an event to the span
    pub fn add_event(&mut self, name: impl Into<String>) {
        self.add_event_with_attributes(name, BTreeMap::new());
    }

    /// Add an event with attributes
    pub fn add_event_with_attributes(
        &mut self,
        name: impl Into<String>,
        attributes: BTreeMap<String, SpanValue>,
    ) {
        self.events.push(SpanEvent {
            name: name.into(),
            timestamp: Utc::now(),
            attributes,
        });
    }

    /// Set span status to error
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = SpanStatus::Error {
            message: message.into(),
        };
    }

    /// Record `error` as an `exception` event
    pub fn record_exception<E: std::error::Error>(&mut self, error: &E) {
        let attributes = BTreeMap::from([
            (
                "exception.type".to_string(),
                SpanValue::from(std::any::type_name::<E>()),
            ),
            (
                "exception.message".to_string(),
                SpanValue::from(error.to_string()),
            ),
        ]);
        self.add_event_with_attributes(EXCEPTION_EVENT, attributes);
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, SpanStatus::Error { .. })
    }

    /// Mark span as finished. An unset status becomes `Ok`.
    pub fn finish(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
        if self.status == SpanStatus::Unset {
            self.status = SpanStatus::Ok;
        }
    }

    /// Create a tracing span for integration with tracing crate
    pub fn to_tracing_span(&self) -> span::Span {
        span!(
            Level::INFO,
            "activity_span",
            name = %self.name,
            component = %self.component,
            kind = ?self.kind,
            trace_id = %self.context.trace_id,
            span_id = %self.context.span_id,
            parent_span_id = ?self.context.parent_span_id.map(|id| id.to_string()),
        )
    }
}

/// Span kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    /// Internal operation
    Internal,
    /// Orchestration issuing an activity call
    Client,
    /// Activity receiving a call
    Consumer,
}

/// Span status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    /// Unset status
    Unset,
    /// Operation succeeded
    Ok,
    /// Operation failed
    Error { message: String },
}

/// Span attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpanValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<String> for SpanValue {
    fn from(v: String) -> Self {
        SpanValue::String(v)
    }
}

impl From<&str> for SpanValue {
    fn from(v: &str) -> Self {
        SpanValue::String(v.to_string())
    }
}

impl From<i64> for SpanValue {
    fn from(v: i64) -> Self {
        SpanValue::Int(v)
    }
}

impl From<u64> for SpanValue {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(SpanValue::Int)
            .unwrap_or_else(|_| SpanValue::String(v.to_string()))
    }
}

impl From<usize> for SpanValue {
    fn from(v: usize) -> Self {
        SpanValue::from(v as u64)
    }
}

impl From<f64> for SpanValue {
    fn from(v: f64) -> Self {
        SpanValue::Float(v)
    }
}

impl From<bool> for SpanValue {
    fn from(v: bool) -> Self {
        SpanValue::Bool(v)
    }
}

impl From<&Value> for SpanValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::String(s) => SpanValue::String(s.clone()),
            Value::Bool(b) => SpanValue::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(SpanValue::Int)
                .or_else(|| n.as_f64().map(SpanValue::Float))
                .unwrap_or_else(|| SpanValue::String(n.to_string())),
            other => SpanValue::String(other.to_string()),
        }
    }
}

/// Span event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanEvent {
    /// Event name
    pub name: String,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Event attributes
    pub attributes: BTreeMap<String, SpanValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_span() -> ActivitySpan {
        ActivitySpan::new("GetSecret", "orchestrator", SpanKind::Client, TraceContext::new_root())
    }

    #[test]
    fn test_tag_from_properties() {
        let props: ObservabilityProperties = serde_json::from_value(json!({
            "traceparent": "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "correlationId": "c-42",
            "attempt": 2,
            "dryRun": false,
            "extra": { "a": 1 },
        }))
        .unwrap();

        let mut span = make_span();
        span.tag_from_properties(&props);

        assert_eq!(span.attributes.len(), 4);
        assert_eq!(
            span.attributes.get("observability.correlationId"),
            Some(&SpanValue::String("c-42".into()))
        );
        assert_eq!(span.attributes.get("observability.attempt"), Some(&SpanValue::Int(2)));
        assert_eq!(span.attributes.get("observability.dryRun"), Some(&SpanValue::Bool(false)));
        assert_eq!(
            span.attributes.get("observability.extra"),
            Some(&SpanValue::String(r#"{"a":1}"#.into()))
        );
        assert!(!span.attributes.contains_key("observability.traceparent"));
    }

    #[test]
    fn test_record_exception() {
        let mut span = make_span();
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "vault unreachable");
        span.set_error(err.to_string());
        span.record_exception(&err);

        assert!(span.is_error());
        assert_eq!(span.events.len(), 1);
        assert_eq!(span.events[0].name, EXCEPTION_EVENT);
        assert_eq!(
            span.events[0].attributes.get("exception.message"),
            Some(&SpanValue::String("vault unreachable".into()))
        );
    }

    #[test]
    fn test_span_finish() {
        let mut span = make_span();
        assert!(span.end_time.is_none());
        assert_eq!(span.status, SpanStatus::Unset);

        span.finish();
        assert!(span.end_time.is_some());
        assert!(span.duration().is_some());
        assert_eq!(span.status, SpanStatus::Ok);
    }

    #[test]
    fn test_finish_keeps_error_status() {
        let mut span = make_span();
        span.set_error("boom");
        span.finish();
        assert!(span.is_error());
    }
}
