// src/store.rs
// ============================================================================
// Module: Event Store
// Description: Thread-safe, append-only container of observed events with
// secondary indexes by thread, turn, and actor.
// Purpose: Give readers consistent snapshots while a single writer appends.
// Dependencies: crate::{error, identifiers, model}, std::sync
// ============================================================================

//! ## Overview
//! [`EventStore`] never removes or mutates a stored event. A single
//! `RwLock` guards the event vector and its three secondary indexes so an
//! append and its index updates land atomically; readers clone a snapshot
//! under a shared lock and never block a concurrent append for longer than
//! the clone takes.
//!
//! Security posture: not applicable; this crate trusts its caller to have
//! already authenticated the gateway feed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::IngestError;
use crate::identifiers::Actor;
use crate::identifiers::EventId;
use crate::identifiers::ThreadId;
use crate::identifiers::TurnId;
use crate::model::EventKind;
use crate::model::ObservedEvent;

// ============================================================================
// SECTION: Inner State
// ============================================================================

/// Inner append-only state guarded by the store's lock.
#[derive(Debug, Default)]
struct Inner {
    /// Events in append order.
    events: Vec<ObservedEvent>,
    /// `thread_id` -> ordered slot indices.
    by_thread: HashMap<ThreadId, Vec<usize>>,
    /// `turn_id` -> ordered slot indices.
    by_turn: HashMap<TurnId, Vec<usize>>,
    /// `actor` -> ordered slot indices.
    by_actor: HashMap<Actor, Vec<usize>>,
}

// ============================================================================
// SECTION: Event Store
// ============================================================================

/// Append-only, thread-safe store of [`ObservedEvent`]s with secondary
/// indexes by thread, turn, and actor.
///
/// # Invariants
/// - Events are never removed or mutated once appended.
/// - Insertion order equals strictly increasing `event_id` order.
#[derive(Debug, Default)]
pub struct EventStore {
    inner: RwLock<Inner>,
}

impl EventStore {
    /// Creates a new, empty event store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observed event, returning its 0-based slot index.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::NonMonotonicIngest`] when `event.event_id` is
    /// not strictly greater than the last stored `event_id`.
    pub fn append(&self, event: ObservedEvent) -> Result<usize, IngestError> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let last = inner.events.last().map(|e| e.event_id);
        if let Some(last_id) = last
            && event.event_id <= last_id
        {
            return Err(IngestError::NonMonotonicIngest {
                received: event.event_id,
                last,
            });
        }

        let index = inner.events.len();
        if let Some(thread_id) = event.thread_id.clone() {
            inner.by_thread.entry(thread_id).or_default().push(index);
        }
        if let Some(turn_id) = event.turn_id.clone() {
            inner.by_turn.entry(turn_id).or_default().push(index);
        }
        if let Some(actor) = event.actor.clone() {
            inner.by_actor.entry(actor).or_default().push(index);
        }
        inner.events.push(event);
        Ok(index)
    }

    /// Returns the number of stored events.
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner).events.len()
    }

    /// Returns a snapshot of the last stored `event_id`, or `None` when
    /// empty.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner).events.last().map(|e| e.event_id)
    }

    /// Returns a snapshot of all stored events, in append order.
    #[must_use]
    pub fn all(&self) -> Vec<ObservedEvent> {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner).events.clone()
    }

    /// Returns a snapshot of events for `thread_id`, in append order.
    #[must_use]
    pub fn by_thread(&self, thread_id: &ThreadId) -> Vec<ObservedEvent> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Self::collect(&inner.events, inner.by_thread.get(thread_id))
    }

    /// Returns a snapshot of events for `turn_id`, in append order.
    #[must_use]
    pub fn by_turn(&self, turn_id: &TurnId) -> Vec<ObservedEvent> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Self::collect(&inner.events, inner.by_turn.get(turn_id))
    }

    /// Returns a snapshot of events for `actor`, in append order.
    #[must_use]
    pub fn by_actor(&self, actor: &Actor) -> Vec<ObservedEvent> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Self::collect(&inner.events, inner.by_actor.get(actor))
    }

    /// Returns events with `event_id > after`, capped at `limit`, plus the
    /// cursor to resume from.
    #[must_use]
    pub fn tail(&self, after: Option<EventId>, limit: usize) -> (Vec<ObservedEvent>, Option<EventId>) {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let start = after.map_or(0, |after_id| {
            inner.events.partition_point(|e| e.event_id <= after_id)
        });
        let page: Vec<ObservedEvent> = inner.events[start..].iter().take(limit).cloned().collect();
        let next_cursor = page.last().map(|e| e.event_id);
        (page, next_cursor)
    }

    /// Returns, for every thread with at least one stored event, the count
    /// of `error`-kind events among its trailing `window` events (in append
    /// order). Feeds [`crate::signals::SignalEngine::evaluate`]'s
    /// `recent_thread_errors` parameter so `error_cluster` can be judged
    /// against "within its last N events" rather than the thread's whole
    /// history. Threads are returned in ascending `ThreadId` order so the
    /// result is deterministic across calls.
    #[must_use]
    pub fn recent_thread_error_counts(&self, window: u64) -> Vec<(ThreadId, u64)> {
        let window = usize::try_from(window).unwrap_or(usize::MAX);
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut counts: Vec<(ThreadId, u64)> = inner
            .by_thread
            .iter()
            .map(|(thread_id, indices)| {
                let tail_start = indices.len().saturating_sub(window);
                let error_count = indices[tail_start..]
                    .iter()
                    .filter_map(|&index| inner.events.get(index))
                    .filter(|event| event.kind == EventKind::Error)
                    .count();
                #[allow(clippy::cast_possible_truncation, reason = "per-thread windowed counts never approach u64::MAX")]
                let error_count = error_count as u64;
                (thread_id.clone(), error_count)
            })
            .collect();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }

    /// Collects a snapshot of events at the given slot indices.
    fn collect(events: &[ObservedEvent], indices: Option<&Vec<usize>>) -> Vec<ObservedEvent> {
        indices
            .into_iter()
            .flatten()
            .filter_map(|&index| events.get(index))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only panic-based assertions are permitted."
    )]
    use crate::identifiers::Artifact;
    use crate::identifiers::Source;
    use crate::model::EventKind;
    use crate::payload::PayloadValue;

    use super::*;

    fn event(id: i64, thread: Option<&str>) -> ObservedEvent {
        ObservedEvent {
            event_id: EventId(id),
            source: Source::new("gateway"),
            artifact: Artifact::new("turn"),
            thread_id: thread.map(ThreadId::new),
            turn_id: None,
            parent_turn_id: None,
            actor: None,
            kind: EventKind::Other,
            decision_result: None,
            policy_version: None,
            latency_ms: None,
            observed_at: 0,
            payload: PayloadValue::Null,
        }
    }

    #[test]
    fn append_rejects_non_increasing_event_ids() {
        let store = EventStore::new();
        store.append(event(5, None)).expect("first append");
        let err = store.append(event(5, None)).unwrap_err();
        assert!(matches!(err, IngestError::NonMonotonicIngest { .. }));
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn by_thread_returns_only_matching_events_in_order() {
        let store = EventStore::new();
        store.append(event(1, Some("T1"))).expect("append");
        store.append(event(2, Some("T2"))).expect("append");
        store.append(event(3, Some("T1"))).expect("append");

        let events = store.by_thread(&ThreadId::new("T1"));
        let ids: Vec<i64> = events.iter().map(|e| e.event_id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn tail_respects_cursor_and_limit() {
        let store = EventStore::new();
        for id in 1..=5 {
            store.append(event(id, None)).expect("append");
        }
        let (page, cursor) = store.tail(Some(EventId(2)), 2);
        let ids: Vec<i64> = page.iter().map(|e| e.event_id.get()).collect();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(cursor, Some(EventId(4)));
    }

    #[test]
    fn event_with_no_keys_updates_no_secondary_index() {
        let store = EventStore::new();
        store.append(event(1, None)).expect("append");
        assert!(store.by_thread(&ThreadId::new("anything")).is_empty());
    }

    fn error_event(id: i64, thread: &str) -> ObservedEvent {
        ObservedEvent {
            kind: EventKind::Error,
            ..event(id, Some(thread))
        }
    }

    #[test]
    fn recent_thread_error_counts_only_considers_trailing_window() {
        let store = EventStore::new();
        store.append(error_event(1, "T1")).expect("append");
        store.append(error_event(2, "T1")).expect("append");
        store.append(event(3, Some("T1"))).expect("append");
        store.append(event(4, Some("T1"))).expect("append");

        let counts = store.recent_thread_error_counts(2);
        assert_eq!(counts, vec![(ThreadId::new("T1"), 0)]);

        let counts = store.recent_thread_error_counts(4);
        assert_eq!(counts, vec![(ThreadId::new("T1"), 2)]);
    }

    #[test]
    fn recent_thread_error_counts_are_sorted_by_thread_id() {
        let store = EventStore::new();
        store.append(error_event(1, "T2")).expect("append");
        store.append(error_event(2, "T1")).expect("append");

        let counts = store.recent_thread_error_counts(10);
        assert_eq!(counts, vec![(ThreadId::new("T1"), 1), (ThreadId::new("T2"), 1)]);
    }
}
