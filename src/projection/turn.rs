// src/projection/turn.rs
// ============================================================================
// Module: Turn Summary
// Description: Per-turn decision, execution, and error aggregation.
// Purpose: Hold the deterministic summary maintained for each turn_id.
// Dependencies: crate::{identifiers, model}
// ============================================================================

//! ## Overview
//! One [`TurnSummary`] exists per `turn_id` ever observed; it is created on
//! first sight and never removed. The first `decision` event for a turn
//! wins; later decisions attach [`TurnSummary::duplicate_decision_observed`]
//! but never overwrite the recorded outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::identifiers::EventId;
use crate::identifiers::TurnId;
use crate::model::DecisionResult;

// ============================================================================
// SECTION: Turn Summary
// ============================================================================

/// Deterministic per-turn aggregate.
///
/// # Invariants
/// - `decision_result`/`latency_ms` are set at most once; later `decision`
///   events set `duplicate_decision_observed` instead of overwriting them.
/// - `first_event_id <= last_event_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    /// The turn this summary describes.
    pub turn_id: TurnId,
    /// First-observed decision outcome, or `None` if no decision has been
    /// observed (the spec's `null`).
    pub decision_result: Option<DecisionResult>,
    /// Latency recorded from the deciding `decision` event, if present.
    pub latency_ms: Option<u64>,
    /// Set once any `execution` event for this turn is observed.
    pub has_execution: bool,
    /// Set once any `error` event for this turn is observed.
    pub has_error: bool,
    /// Prior turn in the same thread, recorded on first sight.
    pub parent_turn_id: Option<TurnId>,
    /// Lowest `event_id` observed for this turn.
    pub first_event_id: EventId,
    /// Highest `event_id` observed for this turn.
    pub last_event_id: EventId,
    /// Internal marker: a second or later `decision` event was observed
    /// after the outcome was already set. Surfaced only through the per-turn
    /// query surface, never in the frozen wire diagnostics vocabulary.
    pub duplicate_decision_observed: bool,
    /// Set once the first `decision` event for this turn has been folded in,
    /// independent of whether its `decision_result` was `null`. Distinguishes
    /// "no decision yet" from "a decision was observed with a null result".
    decision_seen: bool,
}

impl TurnSummary {
    /// Creates a fresh summary for a turn first observed at `event_id`.
    #[must_use]
    pub const fn new(turn_id: TurnId, event_id: EventId) -> Self {
        Self {
            turn_id,
            decision_result: None,
            latency_ms: None,
            has_execution: false,
            has_error: false,
            parent_turn_id: None,
            first_event_id: event_id,
            last_event_id: event_id,
            duplicate_decision_observed: false,
            decision_seen: false,
        }
    }

    /// Extends the `[first_event_id, last_event_id]` bounds to include
    /// `event_id`.
    pub fn extend_bounds(&mut self, event_id: EventId) {
        if event_id < self.first_event_id {
            self.first_event_id = event_id;
        }
        if event_id > self.last_event_id {
            self.last_event_id = event_id;
        }
    }

    /// Records a `decision` event's outcome, honoring first-decision-wins
    /// semantics. The *first* `decision` event observed wins, even when its
    /// `decision_result` is `null`; every later `decision` event only sets
    /// [`Self::duplicate_decision_observed`] and never overwrites the
    /// recorded outcome or latency.
    pub fn record_decision(&mut self, result: Option<DecisionResult>, latency_ms: Option<u64>) {
        if self.decision_seen {
            self.duplicate_decision_observed = true;
            return;
        }
        self.decision_seen = true;
        self.decision_result = result;
        self.latency_ms = latency_ms;
    }
}
