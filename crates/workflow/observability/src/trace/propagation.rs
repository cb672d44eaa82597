//! Context propagation through payload properties
//!
//! Trace context is written into [`ObservabilityProperties`] using the W3C
//! Trace Context and Baggage text encodings, so it survives as plain JSON
//! inside persisted request payloads.

use super::context::TraceContext;
use crate::error::{ObservabilityError, Result};
use opentelemetry::trace::{SpanId, TraceFlags, TraceId};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::BTreeMap;
use workflow_types::ObservabilityProperties;

/// W3C `traceparent` key
pub const TRACEPARENT: &str = "traceparent";

/// W3C `tracestate` key
pub const TRACESTATE: &str = "tracestate";

/// W3C `baggage` key
pub const BAGGAGE: &str = "baggage";

const SUPPORTED_VERSION: &str = "00";
const INVALID_VERSION: &str = "ff";

// Characters outside the W3C baggage value charset
const BAGGAGE_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%')
    .add(b'=');

/// Write `context` into `properties`.
///
/// An invalid context writes nothing. Existing trace keys are replaced;
/// unrelated keys are left untouched.
pub fn inject(properties: &mut ObservabilityProperties, context: &TraceContext) {
    if !context.is_valid() {
        return;
    }

    properties.insert(TRACEPARENT, context.traceparent());

    match context.trace_state.as_deref().filter(|s| !s.is_empty()) {
        Some(state) => {
            properties.insert(TRACESTATE, state);
        }
        None => {
            properties.remove(TRACESTATE);
        }
    }

    if context.baggage.is_empty() {
        properties.remove(BAGGAGE);
    } else {
        properties.insert(BAGGAGE, encode_baggage(&context.baggage));
    }
}

/// Read a context back out of `properties`.
///
/// Missing or malformed values yield [`TraceContext::empty`].
pub fn extract(properties: &ObservabilityProperties) -> TraceContext {
    let Some(traceparent) = properties.get_str(TRACEPARENT) else {
        return TraceContext::empty();
    };

    let (trace_id, span_id, flags) = match parse_traceparent(traceparent) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring propagated trace context");
            return TraceContext::empty();
        }
    };

    TraceContext {
        trace_id,
        span_id,
        parent_span_id: None,
        flags,
        trace_state: properties
            .get_str(TRACESTATE)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        baggage: properties
            .get_str(BAGGAGE)
            .map(decode_baggage)
            .unwrap_or_default(),
        remote: true,
    }
}

/// Parse a `traceparent` value into its identifiers and flags
pub fn parse_traceparent(value: &str) -> Result<(TraceId, SpanId, TraceFlags)> {
    let invalid = || ObservabilityError::InvalidTraceParent(value.to_string());

    let parts: Vec<&str> = value.trim().split('-').collect();
    if parts.len() < 4 {
        return Err(invalid());
    }

    let version = parts[0];
    if !is_lower_hex(version, 2) || version == INVALID_VERSION {
        return Err(invalid());
    }
    // Future versions may append fields; version 00 may not
    if version == SUPPORTED_VERSION && parts.len() != 4 {
        return Err(invalid());
    }

    let (trace_hex, span_hex, flags_hex) = (parts[1], parts[2], parts[3]);
    if !is_lower_hex(trace_hex, 32) || !is_lower_hex(span_hex, 16) || !is_lower_hex(flags_hex, 2)
    {
        return Err(invalid());
    }

    let trace_id = TraceId::from_hex(trace_hex).map_err(|_| invalid())?;
    let span_id = SpanId::from_hex(span_hex).map_err(|_| invalid())?;
    let flags = u8::from_str_radix(flags_hex, 16).map_err(|_| invalid())?;

    if trace_id == TraceId::INVALID || span_id == SpanId::INVALID {
        return Err(invalid());
    }

    Ok((trace_id, span_id, TraceFlags::new(flags)))
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn encode_baggage(baggage: &BTreeMap<String, String>) -> String {
    baggage
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, BAGGAGE_ENCODE_SET),
                utf8_percent_encode(value, BAGGAGE_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_baggage(header: &str) -> BTreeMap<String, String> {
    header
        .split(',')
        .filter_map(|member| {
            // Member properties after ';' are dropped
            let pair = member.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            let key = percent_decode_str(key.trim()).decode_utf8().ok()?;
            let value = percent_decode_str(value.trim()).decode_utf8().ok()?;
            (!key.is_empty()).then(|| (key.into_owned(), value.into_owned()))
        })
        .collect()
}
