// src/projection/actor.rs
// ============================================================================
// Module: Actor Summary
// Description: Per-actor decision/execution/error counters.
// Purpose: Hold the deterministic summary maintained for each actor label.
// Dependencies: crate::{identifiers, model}
// ============================================================================

//! ## Overview
//! One [`ActorSummary`] exists per `actor` ever observed, created on first
//! sight and never removed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::identifiers::Actor;
use crate::model::DecisionResult;
use crate::model::EventKind;

// ============================================================================
// SECTION: Actor Summary
// ============================================================================

/// Deterministic per-actor aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSummary {
    /// The actor this summary describes.
    pub actor: Actor,
    /// Total events observed for this actor.
    pub event_count: u64,
    /// Count of `decision` events with `decision_result = deny`.
    pub deny_count: u64,
    /// Count of `decision` events with `decision_result = allow`.
    pub allow_count: u64,
    /// Count of `error` events.
    pub error_count: u64,
    /// Timestamp of the most recently observed event for this actor.
    pub last_observed_at: i64,
}

impl ActorSummary {
    /// Creates a fresh summary for an actor first observed at `observed_at`.
    #[must_use]
    pub const fn new(actor: Actor, observed_at: i64) -> Self {
        Self {
            actor,
            event_count: 0,
            deny_count: 0,
            allow_count: 0,
            error_count: 0,
            last_observed_at: observed_at,
        }
    }

    /// Folds one event's counters into this summary.
    pub fn apply_event(&mut self, kind: EventKind, decision_result: Option<DecisionResult>, observed_at: i64) {
        self.event_count += 1;
        self.last_observed_at = observed_at;

        match kind {
            EventKind::Decision => match decision_result {
                Some(DecisionResult::Allow) => self.allow_count += 1,
                Some(DecisionResult::Deny) => self.deny_count += 1,
                None => {}
            },
            EventKind::Error => self.error_count += 1,
            EventKind::Execution | EventKind::PolicyChange | EventKind::Other => {}
        }
    }
}
