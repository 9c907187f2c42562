// src/trace.rs
// ============================================================================
// Module: Wire Trace Pipeline
// Description: Converts raw trace items into diagnosed wire events and
// parses/serializes the strict v1 wire trace line format.
// Purpose: Give the (out-of-scope) CLI a pure, I/O-free pipeline from raw
// line-delimited input to rendered, diagnosed trace output.
// Dependencies: crate::{canonical, diagnostics, digest, error, identifiers,
// model, payload}, serde, serde_json
// ============================================================================

//! ## Overview
//! This module is the trace-oriented twin of [`crate::ingest`]: instead of
//! feeding an [`crate::store::EventStore`], it turns a sequence of raw
//! observed items into [`WireEvent`]s annotated with
//! [`crate::diagnostics`] labels, and reads/writes the strict v1 wire trace
//! line format. Neither direction performs file or socket I/O; a caller
//! supplies lines and receives lines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::canonical::canonical_bytes;
use crate::diagnostics;
use crate::diagnostics::DiagnosticsReport;
use crate::diagnostics::TraceRecord;
use crate::digest::digest_bytes;
use crate::error::IngestError;
use crate::identifiers::Artifact;
use crate::identifiers::EventId;
use crate::identifiers::Source;
use crate::model::ObservedEvent;
use crate::model::WireEvent;
use crate::payload::PayloadValue;

// ============================================================================
// SECTION: Raw Trace Item
// ============================================================================

/// One line of raw input to the trace pipeline: `{event_id, source,
/// artifact, payload}`, carrying no thread/turn/actor context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    /// Event identifier as recorded in the raw line.
    event_id: EventId,
    /// Opaque adapter label.
    source: Source,
    /// Opaque artifact class label.
    artifact: Artifact,
    /// Payload body, canonicalized by this pipeline.
    payload: Value,
}

/// Parses one line of raw trace input into an [`ObservedEvent`].
///
/// The returned event carries no thread/turn/actor/kind context: the raw
/// trace format (spec §6) only supplies `event_id`, `source`, `artifact`,
/// and `payload`.
///
/// # Errors
///
/// Returns [`IngestError::InvalidInput`] when `line` is not valid JSON or is
/// missing a required field, and [`IngestError::Canonicalization`] when the
/// payload contains a float or non-finite number.
pub fn parse_raw_line(line: &str) -> Result<ObservedEvent, IngestError> {
    let raw: RawItem = serde_json::from_str(line).map_err(|error| IngestError::InvalidInput(format!("malformed raw trace line: {error}")))?;
    let payload = PayloadValue::from_json(&raw.payload)?;

    Ok(ObservedEvent {
        event_id: raw.event_id,
        source: raw.source,
        artifact: raw.artifact,
        thread_id: None,
        turn_id: None,
        parent_turn_id: None,
        actor: None,
        kind: crate::model::EventKind::Other,
        decision_result: None,
        policy_version: None,
        latency_ms: None,
        observed_at: 0,
        payload,
    })
}

// ============================================================================
// SECTION: Wire Event Construction
// ============================================================================

impl WireEvent {
    /// Derives a [`WireEvent`] from an [`ObservedEvent`], computing
    /// `canon_len` and `digest` over its payload. `diagnostics` starts
    /// empty; whole-trace labels are merged in afterward by
    /// [`attach_diagnostics`].
    #[must_use]
    pub fn from_observed(event: ObservedEvent) -> Self {
        let canonical = canonical_bytes(&event.payload);
        let canon_len = canonical.len();
        let digest = digest_bytes(&canonical);
        Self {
            event,
            canon_len,
            digest,
            diagnostics: Vec::new(),
        }
    }
}

/// Builds the wire trace for a sequence of observed items, running the
/// diagnostics engine over the whole trace (optionally against a reference
/// trace) and attaching per-event labels to each resulting [`WireEvent`].
///
/// Returns the diagnosed wire events alongside the trace-level diagnostic
/// labels.
#[must_use]
pub fn build_trace(items: Vec<ObservedEvent>, reference: Option<&[TraceRecord]>) -> (Vec<WireEvent>, DiagnosticsReport) {
    let mut events: Vec<WireEvent> = items.into_iter().map(WireEvent::from_observed).collect();

    let records: Vec<TraceRecord> = events
        .iter()
        .map(|wire| TraceRecord {
            event_id: wire.event.event_id,
            payload: wire.event.payload.clone(),
            canon_len: wire.canon_len,
            digest: wire.digest.clone(),
        })
        .collect();

    let report = diagnostics::analyze(&records, reference);
    for (event, labels) in events.iter_mut().zip(report.per_event.iter()) {
        event.diagnostics.clone_from(labels);
    }

    (events, report)
}

// ============================================================================
// SECTION: Strict Wire Trace Line
// ============================================================================

/// The strict v1 wire trace line format (spec §6): exactly `event_id`,
/// `source`, `artifact`, `payload`, `canon_len`, `digest`, `diagnostics`.
/// Unknown fields reject the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireTraceLine {
    /// Event identifier.
    pub event_id: EventId,
    /// Opaque adapter label.
    pub source: Source,
    /// Opaque artifact class label.
    pub artifact: Artifact,
    /// Payload body.
    pub payload: PayloadValue,
    /// Byte length of the canonical payload encoding.
    pub canon_len: usize,
    /// `sha256:<hex>` digest of the canonical payload encoding.
    pub digest: String,
    /// Per-event diagnostic labels.
    pub diagnostics: Vec<String>,
}

impl From<&WireEvent> for WireTraceLine {
    fn from(wire: &WireEvent) -> Self {
        Self {
            event_id: wire.event.event_id,
            source: wire.event.source.clone(),
            artifact: wire.event.artifact.clone(),
            payload: wire.event.payload.clone(),
            canon_len: wire.canon_len,
            digest: wire.digest.clone(),
            diagnostics: wire.diagnostics.clone(),
        }
    }
}

impl From<&WireTraceLine> for TraceRecord {
    fn from(line: &WireTraceLine) -> Self {
        Self {
            event_id: line.event_id,
            payload: line.payload.clone(),
            canon_len: line.canon_len,
            digest: line.digest.clone(),
        }
    }
}

/// Serializes a [`WireEvent`] to one strict v1 wire trace JSON line (no
/// trailing newline).
///
/// # Errors
///
/// Returns [`IngestError::InvalidInput`] if serialization fails, which can
/// only happen if the payload is not representable in JSON (unreachable for
/// a well-formed [`PayloadValue`]).
pub fn render_wire_line(wire: &WireEvent) -> Result<String, IngestError> {
    serde_json::to_string(&WireTraceLine::from(wire)).map_err(|error| IngestError::InvalidInput(format!("failed to render wire trace line: {error}")))
}

/// Parses one strict v1 wire trace JSON line.
///
/// # Errors
///
/// Returns [`IngestError::InvalidInput`] when `line` is not valid JSON, is
/// missing a required field, or carries a field outside the frozen v1
/// schema.
pub fn parse_wire_line(line: &str) -> Result<WireTraceLine, IngestError> {
    serde_json::from_str(line).map_err(|error| IngestError::InvalidInput(format!("malformed wire trace line: {error}")))
}
