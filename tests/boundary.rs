// tests/boundary.rs
// ============================================================================
// Module: Boundary Behavior Tests
// Description: Empty-store, single-event, context-free-event, latency-
// capacity, and first-event-is-policy-change boundaries from spec §8.
// Purpose: Pin down behavior at the edges the unit tests don't reach.
// ============================================================================

//! Boundary-behavior tests (spec §8).

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use gatewatch::DecisionResult;
use gatewatch::EventKind;
use gatewatch::EventStore;
use gatewatch::ObservedEvent;
use gatewatch::PayloadValue;
use gatewatch::ProjectionIndex;
use gatewatch::SignalEngine;
use gatewatch::SignalThresholds;
use gatewatch::identifiers::Artifact;
use gatewatch::identifiers::EventId;
use gatewatch::identifiers::PolicyVersion;
use gatewatch::identifiers::Source;

fn event(id: i64) -> ObservedEvent {
    ObservedEvent {
        event_id: EventId(id),
        source: Source::new("gw"),
        artifact: Artifact::new("turn"),
        thread_id: None,
        turn_id: None,
        parent_turn_id: None,
        actor: None,
        kind: EventKind::Other,
        decision_result: None,
        policy_version: None,
        latency_ms: None,
        observed_at: id,
        payload: PayloadValue::Null,
    }
}

#[test]
fn empty_store_yields_empty_summaries_and_no_signals() {
    let projection = ProjectionIndex::new();
    let status = projection.status();

    assert_eq!(status.event_count, 0);
    assert!((status.deny_rate - 0.0).abs() < f64::EPSILON);
    assert_eq!(status.latency.count, 0);
    assert_eq!(status.latency.p50, None);
    assert!(projection.threads().is_empty());
    assert!(projection.actors().is_empty());
    assert!(projection.policy_windows().is_empty());

    let engine = SignalEngine::new();
    let signals = engine.evaluate(&status, &[], &[], SignalThresholds::default());
    assert!(signals.is_empty());
}

#[test]
fn single_event_is_observed() {
    let store = EventStore::new();
    let projection = ProjectionIndex::new();
    let mut e = event(1);
    e.kind = EventKind::Decision;
    e.decision_result = Some(DecisionResult::Allow);
    store.append(e.clone()).expect("append");
    projection.on_event(&e);

    assert_eq!(store.size(), 1);
    assert_eq!(projection.status().event_count, 1);
    assert_eq!(projection.status().allow_count, 1);
}

#[test]
fn context_free_event_updates_no_secondary_summary() {
    let projection = ProjectionIndex::new();
    projection.on_event(&event(1));

    assert!(projection.threads().is_empty());
    assert!(projection.actors().is_empty());
    assert_eq!(projection.status().event_count, 1);
}

#[test]
fn latency_buffer_at_exactly_capacity_keeps_all_samples() {
    let projection = ProjectionIndex::new();
    for i in 1..=5000i64 {
        let mut e = event(i);
        e.kind = EventKind::Decision;
        e.decision_result = Some(DecisionResult::Allow);
        e.latency_ms = Some(i.unsigned_abs());
        projection.on_event(&e);
    }
    assert_eq!(projection.latency().count, 5000);
}

#[test]
fn latency_buffer_over_capacity_evicts_oldest() {
    let projection = ProjectionIndex::new();
    for i in 1..=5001i64 {
        let mut e = event(i);
        e.kind = EventKind::Decision;
        e.decision_result = Some(DecisionResult::Allow);
        e.latency_ms = Some(i.unsigned_abs());
        projection.on_event(&e);
    }
    let snapshot = projection.latency();
    assert_eq!(snapshot.count, 5000);
    // the sample for event_id 1 (latency 1) should have been evicted, so p50
    // over [2..=5001] sits strictly above the minimum possible value.
    assert!(snapshot.p50.expect("non-empty") > 1);
}

#[test]
fn policy_change_as_first_event_opens_with_no_predecessor() {
    let projection = ProjectionIndex::new();
    let mut e = event(1);
    e.kind = EventKind::PolicyChange;
    e.policy_version = Some(PolicyVersion::new("v1"));
    projection.on_event(&e);

    let windows = projection.policy_windows();
    assert_eq!(windows.len(), 1);
    assert!(windows[0].is_open());
    assert_eq!(windows[0].started_at_event_id, EventId(1));
}
