//! Distributed tracing for workflows
//!
//! Trace context travels inside request payloads; spans are recorded through
//! component tracers.

pub mod context;
pub mod exporter;
pub mod propagation;
pub mod spans;
pub mod tracer;

pub use context::TraceContext;
pub use exporter::{init_tracing, TracingConfig};
pub use propagation::{extract, inject, parse_traceparent, BAGGAGE, TRACEPARENT, TRACESTATE};
pub use spans::{ActivitySpan, SpanEvent, SpanKind, SpanStatus, SpanValue};
pub use tracer::{LogSpanSink, MemorySpanSink, SpanSink, Tracer};
