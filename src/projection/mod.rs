// src/projection/mod.rs
// ============================================================================
// Module: Projection Index
// Description: Incremental aggregation of the observed event sequence into
// thread, turn, actor, policy-window, and latency summaries.
// Purpose: Give callers O(1)-ish amortized snapshot reads without rescanning
// the event store.
// Dependencies: crate::{identifiers, model}, std::sync
// ============================================================================

//! ## Overview
//! [`ProjectionIndex`] is driven exclusively by [`ProjectionIndex::on_event`],
//! called in the same order events are appended to
//! [`crate::store::EventStore`]. Every summary is a pure function of the
//! event prefix observed so far: replaying the same prefix from an empty
//! index always reproduces identical summaries.

pub mod actor;
pub mod latency;
pub mod policy;
pub mod thread;
pub mod turn;

pub use actor::ActorSummary;
pub use latency::LatencyProfile;
pub use latency::LatencySnapshot;
pub use policy::PolicyWindow;
pub use thread::ThreadSummary;
pub use turn::TurnSummary;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::error::QueryError;
use crate::identifiers::Actor;
use crate::identifiers::EventId;
use crate::identifiers::ThreadId;
use crate::identifiers::TurnId;
use crate::model::DecisionResult;
use crate::model::EventKind;
use crate::model::ObservedEvent;

// ============================================================================
// SECTION: Status Snapshot
// ============================================================================

/// Whole-index counters, independent of any particular thread/actor/turn.
///
/// `active_signals` is deliberately absent here: counting active signals
/// requires [`crate::signals::SignalEngine`] and its thresholds, which this
/// index does not own. Callers compose [`StatusSnapshot`] with a
/// [`crate::signals::SignalEngine`] run to build the full query-surface
/// status document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    /// Total events observed.
    pub event_count: u64,
    /// Distinct threads observed.
    pub thread_count: u64,
    /// Distinct turns observed.
    pub turn_count: u64,
    /// Total `decision` events observed.
    pub decision_count: u64,
    /// Total `decision` events with `decision_result = allow`.
    pub allow_count: u64,
    /// Total `decision` events with `decision_result = deny`.
    pub deny_count: u64,
    /// Total `error` events observed.
    pub error_count: u64,
    /// `deny_count / decision_count`, or `0.0` when `decision_count == 0`.
    pub deny_rate: f64,
    /// Latency percentile snapshot.
    pub latency: LatencySnapshot,
    /// `event_id` of the most recently folded event, or `None` when empty.
    /// Lets signal rules that are windowed by event span (e.g.
    /// `frequent_policy_changes`) compute "within the last N events" without
    /// needing the raw event sequence.
    pub latest_event_id: Option<EventId>,
}

// ============================================================================
// SECTION: Inner State
// ============================================================================

/// Mutable aggregation state guarded by the index's lock.
#[derive(Debug, Default)]
struct Inner {
    /// Total events folded in.
    event_count: u64,
    /// Total `decision` events folded in.
    decision_count: u64,
    /// Total `decision` events with `decision_result = allow`.
    allow_count: u64,
    /// Total `decision` events with `decision_result = deny`.
    deny_count: u64,
    /// Total `error` events folded in.
    error_count: u64,
    /// Per-thread summaries, keyed by `thread_id`.
    threads: HashMap<ThreadId, ThreadSummary>,
    /// Turn ids already seen per thread, used to increment `turns_total`
    /// only on first sight.
    thread_turns_seen: HashMap<ThreadId, HashSet<TurnId>>,
    /// Per-turn summaries, keyed by `turn_id`.
    turns: HashMap<TurnId, TurnSummary>,
    /// Per-actor summaries, keyed by `actor`.
    actors: HashMap<Actor, ActorSummary>,
    /// Policy windows in creation order.
    policy_windows: Vec<PolicyWindow>,
    /// Latency reservoir fed by `decision` events.
    latency: LatencyProfile,
    /// `event_id` of the most recently folded event.
    latest_event_id: Option<EventId>,
}

// ============================================================================
// SECTION: Projection Index
// ============================================================================

/// Incrementally maintained aggregate view over an observed event sequence.
///
/// # Invariants
/// - Every summary reachable from this index is a pure function of the
///   prefix of events passed to [`ProjectionIndex::on_event`] so far.
/// - `on_event` never fails: malformed events are filtered upstream, at the
///   ingest controller.
#[derive(Debug, Default)]
pub struct ProjectionIndex {
    inner: RwLock<Inner>,
}

impl ProjectionIndex {
    /// Creates a new, empty projection index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one observed event into the index. Must be called in the same
    /// order the event was appended to the event store.
    pub fn on_event(&self, event: &ObservedEvent) {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);

        inner.event_count += 1;
        inner.latest_event_id = Some(event.event_id);
        if event.kind == EventKind::Decision {
            inner.decision_count += 1;
            match event.decision_result {
                Some(DecisionResult::Allow) => inner.allow_count += 1,
                Some(DecisionResult::Deny) => inner.deny_count += 1,
                None => {}
            }
        }
        if event.kind == EventKind::Error {
            inner.error_count += 1;
        }

        if let Some(thread_id) = event.thread_id.clone() {
            Self::apply_thread_event(&mut inner, &thread_id, event);
        }
        if let Some(turn_id) = event.turn_id.clone() {
            Self::apply_turn_event(&mut inner, &turn_id, event);
        }
        if let Some(actor) = event.actor.clone() {
            Self::apply_actor_event(&mut inner, &actor, event);
        }
        if event.kind == EventKind::PolicyChange {
            Self::apply_policy_change(&mut inner, event);
        }
        if event.kind == EventKind::Decision
            && let Some(latency_ms) = event.latency_ms
        {
            inner.latency.push(latency_ms);
        }
    }

    /// Updates the thread summary for `thread_id`, including `turns_total`
    /// on first sight of `event.turn_id` within this thread.
    fn apply_thread_event(inner: &mut Inner, thread_id: &ThreadId, event: &ObservedEvent) {
        let summary = inner
            .threads
            .entry(thread_id.clone())
            .or_insert_with(|| ThreadSummary::new(thread_id.clone(), event.event_id, event.observed_at));
        summary.apply_event(event.kind, event.decision_result, event.event_id, event.observed_at);

        if let Some(turn_id) = event.turn_id.clone() {
            let seen = inner.thread_turns_seen.entry(thread_id.clone()).or_default();
            if seen.insert(turn_id) {
                if let Some(summary) = inner.threads.get_mut(thread_id) {
                    summary.turns_total += 1;
                }
            }
        }
    }

    /// Updates or creates the turn summary for `turn_id`, applying
    /// first-decision-wins and `has_execution`/`has_error` semantics.
    fn apply_turn_event(inner: &mut Inner, turn_id: &TurnId, event: &ObservedEvent) {
        let summary = inner
            .turns
            .entry(turn_id.clone())
            .or_insert_with(|| TurnSummary::new(turn_id.clone(), event.event_id));
        summary.extend_bounds(event.event_id);

        if summary.parent_turn_id.is_none() {
            summary.parent_turn_id = event.parent_turn_id.clone();
        }

        match event.kind {
            EventKind::Decision => summary.record_decision(event.decision_result, event.latency_ms),
            EventKind::Execution => summary.has_execution = true,
            EventKind::Error => summary.has_error = true,
            EventKind::PolicyChange | EventKind::Other => {}
        }
    }

    fn apply_actor_event(inner: &mut Inner, actor: &Actor, event: &ObservedEvent) {
        let summary = inner
            .actors
            .entry(actor.clone())
            .or_insert_with(|| ActorSummary::new(actor.clone(), event.observed_at));
        summary.apply_event(event.kind, event.decision_result, event.observed_at);
    }

    fn apply_policy_change(inner: &mut Inner, event: &ObservedEvent) {
        if let Some(open_window) = inner.policy_windows.last_mut()
            && open_window.is_open()
        {
            let close_at = EventId(event.event_id.get().saturating_sub(1));
            open_window.ended_at_event_id = Some(if close_at.get() < open_window.started_at_event_id.get() {
                event.event_id
            } else {
                close_at
            });
        }
        let policy_version = event.policy_version.clone().unwrap_or_else(|| crate::identifiers::PolicyVersion::new(""));
        inner.policy_windows.push(PolicyWindow::open(policy_version, event.event_id));
    }

    // ========================================================================
    // SECTION: Snapshot Getters
    // ========================================================================

    /// Returns whole-index counters and the current latency percentile
    /// snapshot.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let deny_rate = if inner.decision_count == 0 {
            0.0
        } else {
            #[allow(
                clippy::cast_precision_loss,
                reason = "decision counts are observational tallies, not precision-sensitive values"
            )]
            let rate = inner.deny_count as f64 / inner.decision_count as f64;
            rate
        };

        StatusSnapshot {
            event_count: inner.event_count,
            thread_count: inner.threads.len() as u64,
            turn_count: inner.turns.len() as u64,
            decision_count: inner.decision_count,
            allow_count: inner.allow_count,
            deny_count: inner.deny_count,
            error_count: inner.error_count,
            deny_rate,
            latency: inner.latency.snapshot(),
            latest_event_id: inner.latest_event_id,
        }
    }

    /// Returns all thread summaries, sorted by `last_observed_at` descending,
    /// ties broken by `last_event_id` descending then `thread_id` ascending.
    #[must_use]
    pub fn threads(&self) -> Vec<ThreadSummary> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut summaries: Vec<ThreadSummary> = inner.threads.values().cloned().collect();
        summaries.sort_by(|a, b| {
            b.last_observed_at
                .cmp(&a.last_observed_at)
                .then_with(|| b.last_event_id.cmp(&a.last_event_id))
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        });
        summaries
    }

    /// Returns one thread's summary plus its turns, ordered by
    /// `first_event_id` ascending.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotFound`] when `thread_id` has never been
    /// observed.
    pub fn thread(&self, thread_id: &ThreadId) -> Result<(ThreadSummary, Vec<TurnSummary>), QueryError> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let summary = inner
            .threads
            .get(thread_id)
            .ok_or_else(|| QueryError::NotFound(thread_id.to_string()))?
            .clone();
        let seen = inner.thread_turns_seen.get(thread_id);
        let mut turns: Vec<TurnSummary> = seen
            .into_iter()
            .flatten()
            .filter_map(|turn_id| inner.turns.get(turn_id))
            .cloned()
            .collect();
        turns.sort_by_key(|t| t.first_event_id);
        Ok((summary, turns))
    }

    /// Returns all actor summaries, sorted by `event_count` descending, ties
    /// broken by `actor` ascending.
    #[must_use]
    pub fn actors(&self) -> Vec<ActorSummary> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut summaries: Vec<ActorSummary> = inner.actors.values().cloned().collect();
        summaries.sort_by(|a, b| b.event_count.cmp(&a.event_count).then_with(|| a.actor.cmp(&b.actor)));
        summaries
    }

    /// Returns all policy windows in creation order.
    #[must_use]
    pub fn policy_windows(&self) -> Vec<PolicyWindow> {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner).policy_windows.clone()
    }

    /// Returns the current latency percentile snapshot.
    #[must_use]
    pub fn latency(&self) -> LatencySnapshot {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner).latency.snapshot()
    }
}
