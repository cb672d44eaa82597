//! Trace context: a position in a distributed trace

use opentelemetry::trace::{SpanId, TraceFlags, TraceId};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Trace position carried between orchestration steps and activities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// Trace ID (propagated across services)
    pub trace_id: TraceId,

    /// Span ID (unique to this span)
    pub span_id: SpanId,

    /// Parent span ID (if any)
    pub parent_span_id: Option<SpanId>,

    /// W3C trace flags
    pub flags: TraceFlags,

    /// Opaque vendor state (`tracestate`)
    pub trace_state: Option<String>,

    /// Baggage items
    pub baggage: BTreeMap<String, String>,

    /// Whether this context was received from another process
    pub remote: bool,
}

impl Default for TraceContext {
    fn default() -> Self {
        Self {
            trace_id: TraceId::INVALID,
            span_id: SpanId::INVALID,
            parent_span_id: None,
            flags: TraceFlags::new(0),
            trace_state: None,
            baggage: BTreeMap::new(),
            remote: false,
        }
    }
}

impl TraceContext {
    /// The empty context. Nothing is propagated from it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a new sampled root context
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::from_bytes(*Uuid::new_v4().as_bytes()),
            span_id: random_span_id(),
            flags: TraceFlags::SAMPLED,
            ..Self::default()
        }
    }

    /// Both identifiers are set
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }

    pub fn is_sampled(&self) -> bool {
        self.flags.is_sampled()
    }

    /// Create a child context with a fresh random span id
    pub fn child(&self) -> Self {
        if !self.is_valid() {
            return Self::new_root();
        }
        self.child_with_span_id(random_span_id())
    }

    /// Create the child context for the `sequence`-th call made under this one.
    ///
    /// The span id is derived from `(trace_id, span_id, sequence)`, so the
    /// same orchestration replayed later produces the same children. An
    /// invalid context yields an invalid child.
    pub fn child_for_sequence(&self, sequence: u64) -> Self {
        if !self.is_valid() {
            return Self::default();
        }

        let mut hasher = Sha256::new();
        hasher.update(self.trace_id.to_bytes());
        hasher.update(self.span_id.to_bytes());
        hasher.update(sequence.to_be_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        if bytes == [0u8; 8] {
            bytes[7] = 1;
        }
        self.child_with_span_id(SpanId::from_bytes(bytes))
    }

    /// Add a baggage item
    pub fn with_baggage(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.baggage.insert(key.into(), value.into());
        self
    }

    /// Set the vendor trace state
    pub fn with_trace_state(mut self, state: impl Into<String>) -> Self {
        self.trace_state = Some(state.into());
        self
    }

    /// `traceparent` rendering: `00-<trace-id>-<span-id>-<flags>`
    pub fn traceparent(&self) -> String {
        format!(
            "00-{}-{}-{:02x}",
            self.trace_id,
            self.span_id,
            self.flags.to_u8()
        )
    }

    fn child_with_span_id(&self, span_id: SpanId) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id,
            parent_span_id: Some(self.span_id),
            flags: self.flags,
            trace_state: self.trace_state.clone(),
            baggage: self.baggage.clone(),
            remote: false,
        }
    }
}

fn random_span_id() -> SpanId {
    let uuid = Uuid::new_v4();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&uuid.as_bytes()[..8]);
    SpanId::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_context() {
        let ctx = TraceContext::new_root()
            .with_baggage("tenant", "contoso")
            .with_trace_state("vendor=1");

        assert!(ctx.is_valid());
        assert!(ctx.is_sampled());
        assert_eq!(ctx.parent_span_id, None);
        assert_eq!(ctx.baggage.get("tenant"), Some(&"contoso".to_string()));
        assert_eq!(ctx.traceparent().len(), 55);
        assert!(ctx.traceparent().ends_with("-01"));
    }

    #[test]
    fn test_default_is_invalid() {
        let ctx = TraceContext::empty();
        assert!(!ctx.is_valid());
        assert!(!ctx.child_for_sequence(3).is_valid());
    }

    #[test]
    fn test_child_context() {
        let parent = TraceContext::new_root().with_baggage("k", "v");
        let child = parent.child();

        assert_eq!(child.trace_id, parent.trace_id);
        assert_eq!(child.parent_span_id, Some(parent.span_id));
        assert_ne!(child.span_id, parent.span_id);
        assert_eq!(child.baggage, parent.baggage);
    }

    #[test]
    fn test_child_of_invalid_is_new_root() {
        let child = TraceContext::empty().child();
        assert!(child.is_valid());
        assert_eq!(child.parent_span_id, None);
    }

    #[test]
    fn test_sequence_children_are_deterministic() {
        let parent = TraceContext::new_root();

        let first = parent.child_for_sequence(1);
        assert_eq!(first, parent.child_for_sequence(1));
        assert_ne!(first.span_id, parent.child_for_sequence(2).span_id);
        assert_eq!(first.parent_span_id, Some(parent.span_id));
        assert_eq!(first.trace_id, parent.trace_id);
    }
}
