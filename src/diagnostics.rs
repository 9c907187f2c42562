// src/diagnostics.rs
// ============================================================================
// Module: Diagnostics Engine
// Description: Whole-trace structural and replay diagnostics over a sequence
// of trace records, optionally compared against a reference trace.
// Purpose: Surface non-monotonicity, duplication, gaps, and tamper/corruption
// signals without ever rejecting the trace.
// Dependencies: crate::{canonical, digest, identifiers, payload}
// ============================================================================

//! ## Overview
//! The diagnostics engine operates over an entire trace at once (not
//! per-event streaming), attaching per-event labels and emitting trace-level
//! labels. The label vocabulary is frozen at v1 (see [`EVENT_LABELS`] and
//! [`TRACE_LABELS`]); emitting any label outside this set is a bug.
//! Diagnostics never raise: structural anomalies manifest as labels, never
//! errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;

use crate::canonical::canonical_bytes;
use crate::digest::digest_bytes;
use crate::identifiers::EventId;
use crate::payload::PayloadValue;

// ============================================================================
// SECTION: Frozen Label Vocabulary
// ============================================================================

/// Per-event diagnostic labels, frozen at v1.
pub const EVENT_LABELS: [&str; 6] = [
    "duplicate_event_id_observed",
    "non_monotonic_event_id_observed",
    "ordering_gap_observed",
    "canon_len_mismatch_observed",
    "digest_mismatch_observed",
    "reference_digest_mismatch_observed",
];

/// Trace-level diagnostic labels, frozen at v1.
pub const TRACE_LABELS: [&str; 3] = [
    "reference_length_mismatch_observed",
    "reference_event_id_set_mismatch_observed",
    "reference_order_mismatch_observed",
];

// ============================================================================
// SECTION: Trace Record
// ============================================================================

/// One line of a trace being analyzed: the observed `event_id`/payload plus
/// the canonicalization values the trace claims for that payload.
///
/// # Invariants
/// - `canon_len`/`digest` are whatever the trace file claims; they may be
///   stale or tampered, which is exactly what this engine checks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// Event identifier as recorded in the trace.
    pub event_id: EventId,
    /// Payload as recorded in the trace.
    pub payload: PayloadValue,
    /// Canonical length claimed by the trace.
    pub canon_len: usize,
    /// Digest claimed by the trace.
    pub digest: String,
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Diagnostics computed for a trace.
///
/// # Invariants
/// - `per_event` has exactly one entry per input trace record, in order.
/// - Every label in `per_event` and `trace_level` is drawn from
///   [`EVENT_LABELS`]/[`TRACE_LABELS`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagnosticsReport {
    /// Per-event diagnostic labels, aligned by index with the input trace.
    pub per_event: Vec<Vec<String>>,
    /// Trace-level diagnostic labels.
    pub trace_level: Vec<String>,
}

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// Analyzes a trace, optionally against a reference trace.
///
/// # Invariants
/// - Never panics or returns an error; anomalies are surfaced as labels.
#[must_use]
pub fn analyze(trace: &[TraceRecord], reference: Option<&[TraceRecord]>) -> DiagnosticsReport {
    let mut per_event = vec![Vec::new(); trace.len()];
    let mut seen_ids: HashMap<EventId, usize> = HashMap::new();

    for (index, record) in trace.iter().enumerate() {
        if seen_ids.contains_key(&record.event_id) {
            per_event[index].push("duplicate_event_id_observed".to_string());
        }
        seen_ids.entry(record.event_id).or_insert(index);

        if let Some(previous) = index.checked_sub(1) {
            let prev_id = trace[previous].event_id;
            if record.event_id < prev_id {
                per_event[index].push("non_monotonic_event_id_observed".to_string());
            } else if record.event_id.get() > prev_id.get() + 1 {
                per_event[index].push("ordering_gap_observed".to_string());
            }
        }

        let canonical = canonical_bytes(&record.payload);
        if record.canon_len != canonical.len() {
            per_event[index].push("canon_len_mismatch_observed".to_string());
        }
        if record.digest != digest_bytes(&canonical) {
            per_event[index].push("digest_mismatch_observed".to_string());
        }
    }

    let mut trace_level = Vec::new();
    if let Some(reference) = reference {
        trace_level.extend(reference_trace_labels(trace, reference));
        apply_reference_digest_mismatches(trace, reference, &mut per_event);
    }

    DiagnosticsReport {
        per_event,
        trace_level,
    }
}

/// Computes the three trace-level reference diagnostics. Each has an
/// independent predicate per spec: length, set membership, and order are
/// checked separately.
fn reference_trace_labels(trace: &[TraceRecord], reference: &[TraceRecord]) -> Vec<String> {
    let mut labels = Vec::new();

    if trace.len() != reference.len() {
        labels.push("reference_length_mismatch_observed".to_string());
    }

    let trace_ids: HashSet<EventId> = trace.iter().map(|r| r.event_id).collect();
    let reference_ids: HashSet<EventId> = reference.iter().map(|r| r.event_id).collect();
    let sets_match = trace_ids == reference_ids;
    if !sets_match {
        labels.push("reference_event_id_set_mismatch_observed".to_string());
    }

    if sets_match {
        let trace_order: Vec<EventId> = trace.iter().map(|r| r.event_id).collect();
        let reference_order: Vec<EventId> = reference.iter().map(|r| r.event_id).collect();
        if trace_order != reference_order {
            labels.push("reference_order_mismatch_observed".to_string());
        }
    }

    labels
}

/// Attaches `reference_digest_mismatch_observed` at indices where both
/// traces agree on `event_id` order but the digests differ.
fn apply_reference_digest_mismatches(
    trace: &[TraceRecord],
    reference: &[TraceRecord],
    per_event: &mut [Vec<String>],
) {
    for (index, record) in trace.iter().enumerate() {
        let Some(reference_record) = reference.get(index) else {
            continue;
        };
        if reference_record.event_id != record.event_id {
            continue;
        }
        if reference_record.digest != record.digest {
            per_event[index].push("reference_digest_mismatch_observed".to_string());
        }
    }
}
