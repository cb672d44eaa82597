//! Workflow Domain Types
//!
//! Shared data model for durable workflows that drive external, stateless
//! services (object storage, secret stores, document analysis, embedding
//! models) through validated, ordered steps.
//!
//! # Key Concepts
//!
//! - **ValidationResult**: A monotonic verdict. Validity is lost on the first
//!   error-severity message and never regained; child verdicts merge in with a
//!   label prefix.
//! - **WorkflowResult**: The append-only, ordered step log that every
//!   orchestration returns to its caller as `"step::message"` strings.
//! - **ObservabilityProperties**: The string-keyed map every payload carries so
//!   trace context survives serialization, persistence and replay.
//! - **WorkflowRequest**: The capability set `{validate, observability
//!   properties}` realized by every workflow input and every activity request.
//! - **ActivityResponse**: Classification hooks for activity results (empty
//!   results, named soft failures).
//!
//! # Design Principles
//!
//! 1. Requests are plain data. Everything an activity needs, including trace
//!    context, travels inside the payload.
//! 2. Validation happens before any external call and is reported in full.
//! 3. Result ordering is a compatibility contract.

#![deny(unsafe_code)]

mod activities;
mod errors;
mod instance;
mod properties;
mod request;
mod result;
mod severity;
mod storage;
mod validation;
mod workflows;

pub use activities::*;
pub use errors::*;
pub use instance::*;
pub use properties::*;
pub use request::*;
pub use result::*;
pub use severity::*;
pub use storage::*;
pub use validation::*;
pub use workflows::*;
