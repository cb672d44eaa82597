//! Workflow Observability
//!
//! Orchestration state crosses process and time boundaries with no shared
//! memory: a request built by one orchestration step may be executed by an
//! activity on another worker, possibly after a crash and resume. Trace
//! context therefore travels as ordinary payload data.
//!
//! # Key Concepts
//!
//! - **TraceContext**: trace id, span id, flags, trace state and baggage.
//! - **inject / extract**: W3C `traceparent`, `tracestate` and `baggage`
//!   entries written into and read from a payload's observability properties.
//!   Extraction never fails; missing or malformed data yields an empty context.
//! - **Tracer**: a span factory created per component and passed in at
//!   construction. There is no global tracer registry.
//! - **ActivitySpan**: the record of one activity call, tagged from the
//!   request's properties and marked errored on failure.

#![deny(unsafe_code)]

pub mod error;
pub mod trace;

pub use error::{ObservabilityError, Result};
pub use trace::*;
