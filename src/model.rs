// src/model.rs
// ============================================================================
// Module: Observed Event Model
// Description: The ObservedEvent record and the derived WireEvent shape.
// Purpose: Define the canonical observation unit that flows through the
// store, projection, and trace pipelines.
// Dependencies: crate::{identifiers, payload}, serde
// ============================================================================

//! ## Overview
//! [`ObservedEvent`] is what enters [`crate::store::EventStore`]; it is never
//! authoritative and never mutated once stored. [`WireEvent`] is the
//! derived, self-verifying shape the trace pipeline emits, carrying the
//! canonical length, digest, and per-event diagnostics alongside the
//! observed fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::Actor;
use crate::identifiers::Artifact;
use crate::identifiers::EventId;
use crate::identifiers::PolicyVersion;
use crate::identifiers::Source;
use crate::identifiers::ThreadId;
use crate::identifiers::TurnId;
use crate::payload::PayloadValue;

// ============================================================================
// SECTION: Event Kind
// ============================================================================

/// Closed set of observed event kinds.
///
/// # Invariants
/// - Variants are stable for serialization; new kinds require a spec change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A gateway decision (allow/deny) for a turn.
    Decision,
    /// Execution of an already-decided action.
    Execution,
    /// An error observed for a turn or thread.
    Error,
    /// A policy version change.
    PolicyChange,
    /// Anything not covered by the other kinds.
    Other,
}

// ============================================================================
// SECTION: Decision Result
// ============================================================================

/// Outcome of a `decision` event.
///
/// # Invariants
/// - Meaningful only when the owning event's `kind` is [`EventKind::Decision`].
/// - Absence (`None` at call sites) represents the spec's `null`: "not yet
///   observed", not a third logical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionResult {
    /// The gateway allowed the action.
    Allow,
    /// The gateway denied the action.
    Deny,
}

// ============================================================================
// SECTION: Observed Event
// ============================================================================

/// A single record describing something the upstream gateway reported.
///
/// # Invariants
/// - `event_id` is assigned by the gateway and used only as an ordering
///   index; this crate never reinterprets it.
/// - `decision_result` and `latency_ms` are meaningful only when
///   `kind = Decision`; `policy_version` only when `kind = PolicyChange`.
/// - `payload` is JSON-safe: no floats, `NaN`, `Infinity`, or non-string
///   object keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedEvent {
    /// Monotonic event identifier assigned by the gateway.
    pub event_id: EventId,
    /// Opaque adapter label.
    pub source: Source,
    /// Opaque artifact class label.
    pub artifact: Artifact,
    /// Conversation thread, absent for context-free events.
    pub thread_id: Option<ThreadId>,
    /// Turn within the thread.
    pub turn_id: Option<TurnId>,
    /// Prior turn in the same thread, if any.
    pub parent_turn_id: Option<TurnId>,
    /// Actor responsible for the event.
    pub actor: Option<Actor>,
    /// Event kind.
    pub kind: EventKind,
    /// Decision outcome, meaningful only for `kind = Decision`.
    pub decision_result: Option<DecisionResult>,
    /// Policy version, set only on `kind = PolicyChange`.
    pub policy_version: Option<PolicyVersion>,
    /// Observed latency in milliseconds, non-negative when present.
    pub latency_ms: Option<u64>,
    /// Millisecond timestamp assigned at observation time.
    pub observed_at: i64,
    /// JSON-safe payload body.
    pub payload: PayloadValue,
}

// ============================================================================
// SECTION: Wire Event
// ============================================================================

/// [`ObservedEvent`] plus the canonicalization and diagnostics derived for
/// the trace pipeline.
///
/// # Invariants
/// - `canon_len` is the byte length of the canonical encoding of `payload`.
/// - `digest` is `sha256:<lowercase-hex>` over the same canonical bytes.
/// - `diagnostics` contains only labels from the frozen vocabulary in
///   [`crate::diagnostics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEvent {
    /// The underlying observed event.
    pub event: ObservedEvent,
    /// Byte length of the canonical payload encoding.
    pub canon_len: usize,
    /// `sha256:<hex>` digest of the canonical payload encoding.
    pub digest: String,
    /// Per-event diagnostic labels.
    pub diagnostics: Vec<String>,
}
