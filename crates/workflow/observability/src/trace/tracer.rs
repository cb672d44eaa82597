//! Component tracers and span sinks
//!
//! A [`Tracer`] is handed to each component at construction, keyed by the
//! component's name. Finished spans go to the tracer's [`SpanSink`].

use super::context::TraceContext;
use super::spans::{ActivitySpan, SpanKind, SpanStatus};
use parking_lot::Mutex;
use std::sync::Arc;

/// Receives finished spans
pub trait SpanSink: Send + Sync {
    fn record(&self, span: ActivitySpan);
}

/// Emits finished spans as `tracing` events
#[derive(Debug, Default)]
pub struct LogSpanSink;

impl SpanSink for LogSpanSink {
    fn record(&self, span: ActivitySpan) {
        let duration_ms = span.duration().map(|d| d.num_milliseconds());
        let _entered = span.to_tracing_span().entered();
        match &span.status {
            SpanStatus::Error { message } => tracing::warn!(
                events = span.events.len(),
                ?duration_ms,
                error = %message,
                "Span finished with error"
            ),
            _ => tracing::debug!(
                attributes = span.attributes.len(),
                ?duration_ms,
                "Span finished"
            ),
        }
    }
}

/// Keeps finished spans in memory
#[derive(Debug, Default)]
pub struct MemorySpanSink {
    spans: Mutex<Vec<ActivitySpan>>,
}

impl MemorySpanSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<ActivitySpan> {
        self.spans.lock().clone()
    }

    pub fn spans_named(&self, name: &str) -> Vec<ActivitySpan> {
        self.spans
            .lock()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.spans.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.lock().is_empty()
    }

    pub fn clear(&self) {
        self.spans.lock().clear();
    }
}

impl SpanSink for MemorySpanSink {
    fn record(&self, span: ActivitySpan) {
        self.spans.lock().push(span);
    }
}

/// Span factory for one component
#[derive(Clone)]
pub struct Tracer {
    component: String,
    sink: Arc<dyn SpanSink>,
}

impl Tracer {
    /// Tracer that reports through `tracing`
    pub fn new(component: impl Into<String>) -> Self {
        Self::with_sink(component, Arc::new(LogSpanSink))
    }

    pub fn with_sink(component: impl Into<String>, sink: Arc<dyn SpanSink>) -> Self {
        Self {
            component: component.into(),
            sink,
        }
    }

    /// Tracer for another component sharing this tracer's sink
    pub fn for_component(&self, component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Open a span positioned exactly at `context`
    pub fn start_span(
        &self,
        name: impl Into<String>,
        kind: SpanKind,
        context: TraceContext,
    ) -> ActivitySpan {
        ActivitySpan::new(name, self.component.clone(), kind, context)
    }

    /// Open a span as a fresh child of `parent`, or a new root if `parent` is empty
    pub fn start_child(
        &self,
        name: impl Into<String>,
        kind: SpanKind,
        parent: &TraceContext,
    ) -> ActivitySpan {
        self.start_span(name, kind, parent.child())
    }

    /// Finish `span` and hand it to the sink
    pub fn finish(&self, mut span: ActivitySpan) {
        span.finish();
        self.sink.record(span);
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracer_records_into_sink() {
        let sink = Arc::new(MemorySpanSink::new());
        let tracer = Tracer::with_sink("orchestrator", sink.clone());

        let root = TraceContext::new_root();
        let span = tracer.start_child("GetSecret", SpanKind::Client, &root);
        assert_eq!(span.context.parent_span_id, Some(root.span_id));
        tracer.finish(span);

        let spans = sink.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].component, "orchestrator");
        assert_eq!(spans[0].status, SpanStatus::Ok);
        assert!(spans[0].end_time.is_some());
    }

    #[test]
    fn test_for_component_shares_sink() {
        let sink = Arc::new(MemorySpanSink::new());
        let tracer = Tracer::with_sink("host", sink.clone());
        let activities = tracer.for_component("activities");

        let consumed = activities.start_span("ReadBlob", SpanKind::Consumer, TraceContext::empty());
        activities.finish(consumed);
        tracer.finish(tracer.start_span("ReadBlob", SpanKind::Client, TraceContext::empty()));

        assert_eq!(sink.spans_named("ReadBlob").len(), 2);
        assert_eq!(sink.spans()[0].component, "activities");
        assert_eq!(activities.component(), "activities");
    }

    #[test]
    fn test_log_sink_accepts_spans() {
        let tracer = Tracer::new("logging");
        let mut span = tracer.start_child("WriteBlob", SpanKind::Client, &TraceContext::empty());
        span.set_error("denied");
        tracer.finish(span);
    }
}
