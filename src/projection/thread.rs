// src/projection/thread.rs
// ============================================================================
// Module: Thread Summary
// Description: Per-thread decision/execution/error counters.
// Purpose: Hold the deterministic summary maintained for each thread_id.
// Dependencies: crate::{identifiers, model}
// ============================================================================

//! ## Overview
//! One [`ThreadSummary`] exists per `thread_id` ever observed, created on
//! first sight and never removed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::identifiers::EventId;
use crate::identifiers::ThreadId;
use crate::model::DecisionResult;
use crate::model::EventKind;

// ============================================================================
// SECTION: Thread Summary
// ============================================================================

/// Deterministic per-thread aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    /// The thread this summary describes.
    pub thread_id: ThreadId,
    /// Count of distinct turns first observed under this thread.
    pub turns_total: u64,
    /// Count of `decision` events with `decision_result = deny`.
    pub deny_total: u64,
    /// Count of `decision` events with `decision_result = allow`.
    pub allow_total: u64,
    /// Count of `error` events.
    pub error_total: u64,
    /// Lowest `event_id` observed for this thread.
    pub first_event_id: EventId,
    /// Highest `event_id` observed for this thread.
    pub last_event_id: EventId,
    /// Timestamp of the most recently observed event for this thread.
    pub last_observed_at: i64,
}

impl ThreadSummary {
    /// Creates a fresh summary for a thread first observed at `event_id`.
    #[must_use]
    pub const fn new(thread_id: ThreadId, event_id: EventId, observed_at: i64) -> Self {
        Self {
            thread_id,
            turns_total: 0,
            deny_total: 0,
            allow_total: 0,
            error_total: 0,
            first_event_id: event_id,
            last_event_id: event_id,
            last_observed_at: observed_at,
        }
    }

    /// Folds one event's counters and bounds into this summary.
    pub fn apply_event(&mut self, kind: EventKind, decision_result: Option<DecisionResult>, event_id: EventId, observed_at: i64) {
        if event_id < self.first_event_id {
            self.first_event_id = event_id;
        }
        if event_id > self.last_event_id {
            self.last_event_id = event_id;
        }
        self.last_observed_at = observed_at;

        match kind {
            EventKind::Decision => match decision_result {
                Some(DecisionResult::Allow) => self.allow_total += 1,
                Some(DecisionResult::Deny) => self.deny_total += 1,
                None => {}
            },
            EventKind::Error => self.error_total += 1,
            EventKind::Execution | EventKind::PolicyChange | EventKind::Other => {}
        }
    }
}
