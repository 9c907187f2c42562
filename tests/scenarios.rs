// tests/scenarios.rs
// ============================================================================
// Module: End-to-End Scenario Tests
// Description: Scenarios S1-S6 exercising ingest, projection, diagnostics,
// and signal evaluation together.
// Purpose: Confirm the components compose the way spec §8 describes.
// ============================================================================

//! Scenario tests S1 through S6 (spec §8).

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

use gatewatch::EventStore;
use gatewatch::GatewaySnapshot;
use gatewatch::IngestController;
use gatewatch::ProjectionIndex;
use gatewatch::SignalEngine;
use gatewatch::SignalThresholds;
use gatewatch::diagnostics::TraceRecord;
use gatewatch::diagnostics::analyze;
use gatewatch::identifiers::EventId;
use gatewatch::identifiers::ThreadId;
use gatewatch::parse_raw_line;
use serde_json::json;

fn ingest(events: serde_json::Value) -> (EventStore, ProjectionIndex) {
    let store = EventStore::new();
    let projection = ProjectionIndex::new();
    let controller = IngestController::new(&store, &projection);
    let snapshot = GatewaySnapshot::from_json(&json!({ "events": events })).expect("valid envelope");
    controller.ingest_snapshot(&snapshot);
    (store, projection)
}

#[test]
fn s1_basic_allow_deny_counts() {
    let (_, projection) = ingest(json!([
        {"index": 1, "source": "gw", "artifact": "turn", "payload": {"thread_id": "T1", "kind": "decision", "decision_result": "ALLOW", "latency_ms": 100}},
        {"index": 2, "source": "gw", "artifact": "turn", "payload": {"thread_id": "T1", "kind": "execution"}},
        {"index": 3, "source": "gw", "artifact": "turn", "payload": {"thread_id": "T1", "kind": "decision", "decision_result": "DENY", "latency_ms": 200}},
        {"index": 4, "source": "gw", "artifact": "turn", "payload": {"thread_id": "T1", "kind": "error"}},
    ]));

    let status = projection.status();
    assert_eq!(status.event_count, 4);
    assert_eq!(status.thread_count, 1);
    assert_eq!(status.turn_count, 0);
    assert_eq!(status.allow_count, 1);
    assert_eq!(status.deny_count, 1);
    assert_eq!(status.error_count, 1);
    assert!((status.deny_rate - 0.5).abs() < f64::EPSILON);
    assert_eq!(status.latency.count, 2);
    assert_eq!(status.latency.p50, Some(100));
    assert_eq!(status.latency.p95, Some(200));
}

#[test]
fn s2_turn_aggregation() {
    let (_, projection) = ingest(json!([
        {"index": 1, "source": "gw", "artifact": "turn", "payload": {"thread_id": "T", "turn_id": "U", "kind": "decision", "decision_result": "ALLOW", "latency_ms": 50}},
        {"index": 2, "source": "gw", "artifact": "turn", "payload": {"thread_id": "T", "turn_id": "U", "kind": "execution"}},
        {"index": 3, "source": "gw", "artifact": "turn", "payload": {"thread_id": "T", "turn_id": "U", "kind": "decision", "decision_result": "DENY"}},
    ]));

    let (thread, turns) = projection.thread(&ThreadId::new("T")).expect("thread exists");
    assert_eq!(turns.len(), 1);
    let turn = &turns[0];
    assert_eq!(turn.decision_result, Some(gatewatch::DecisionResult::Allow));
    assert_eq!(turn.latency_ms, Some(50));
    assert!(turn.has_execution);
    assert!(turn.duplicate_decision_observed);
    assert_eq!(thread.allow_total, 1);
    assert_eq!(thread.deny_total, 1);
}

#[test]
fn s3_policy_timeline() {
    let (_, projection) = ingest(json!([
        {"index": 10, "source": "gw", "artifact": "turn", "payload": {"kind": "policy_change", "policy_version": "a"}},
        {"index": 20, "source": "gw", "artifact": "turn", "payload": {"kind": "policy_change", "policy_version": "b"}},
        {"index": 30, "source": "gw", "artifact": "turn", "payload": {"kind": "policy_change", "policy_version": "a"}},
    ]));

    let windows = projection.policy_windows();
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[0].policy_version.as_str(), "a");
    assert_eq!(windows[0].started_at_event_id, EventId(10));
    assert_eq!(windows[0].ended_at_event_id, Some(EventId(19)));
    assert_eq!(windows[1].policy_version.as_str(), "b");
    assert_eq!(windows[1].ended_at_event_id, Some(EventId(29)));
    assert_eq!(windows[2].policy_version.as_str(), "a");
    assert!(windows[2].is_open());
}

#[test]
fn s4_reference_diff_diagnostics() {
    let trace: Vec<TraceRecord> = [1, 2, 3]
        .iter()
        .map(|&id| {
            let event = parse_raw_line(&format!(r#"{{"event_id":{id},"source":"gw","artifact":"turn","payload":null}}"#)).expect("parse");
            TraceRecord {
                event_id: event.event_id,
                canon_len: gatewatch::canon_len(&event.payload),
                digest: gatewatch::digest(&event.payload),
                payload: event.payload,
            }
        })
        .collect();

    let reference: Vec<TraceRecord> = [1, 3, 2]
        .iter()
        .map(|&id| {
            let event = parse_raw_line(&format!(r#"{{"event_id":{id},"source":"gw","artifact":"turn","payload":null}}"#)).expect("parse");
            TraceRecord {
                event_id: event.event_id,
                canon_len: gatewatch::canon_len(&event.payload),
                digest: gatewatch::digest(&event.payload),
                payload: event.payload,
            }
        })
        .collect();

    let report = analyze(&trace, Some(&reference));
    assert_eq!(report.trace_level, vec!["reference_order_mismatch_observed".to_string()]);
    assert!(report.per_event.iter().all(Vec::is_empty));
}

#[test]
fn s5_non_monotonic_ingest() {
    let store = EventStore::new();
    let projection = ProjectionIndex::new();
    let controller = IngestController::new(&store, &projection);

    for id in 1..=10 {
        let snapshot = GatewaySnapshot::from_json(&json!({"events": [
            {"index": id, "source": "gw", "artifact": "turn", "payload": {}},
        ]}))
        .expect("valid envelope");
        let report = controller.ingest_snapshot(&snapshot);
        assert!(report.is_complete());
    }
    assert_eq!(store.last_event_id(), Some(EventId(10)));

    let snapshot = GatewaySnapshot::from_json(&json!({"events": [
        {"index": 11, "source": "gw", "artifact": "turn", "payload": {}},
        {"index": 12, "source": "gw", "artifact": "turn", "payload": {}},
        {"index": 9, "source": "gw", "artifact": "turn", "payload": {}},
        {"index": 13, "source": "gw", "artifact": "turn", "payload": {}},
    ]}))
    .expect("valid envelope");
    let report = controller.ingest_snapshot(&snapshot);

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected_at, Some(2));
    assert_eq!(store.last_event_id(), Some(EventId(12)));
    assert_eq!(store.size(), 12);
}

#[test]
fn s6_signal_firing_is_stable_across_runs() {
    let mut events = Vec::new();
    for i in 1..=100i64 {
        let result = if i <= 60 { "DENY" } else { "ALLOW" };
        events.push(json!({"index": i, "source": "gw", "artifact": "turn", "payload": {
            "kind": "decision", "decision_result": result, "latency_ms": 1200,
        }}));
    }

    let (store, projection) = ingest(serde_json::Value::Array(events));
    let status = projection.status();
    assert_eq!(status.latency.p95, Some(1200));

    let engine = SignalEngine::new();
    let thresholds = SignalThresholds::default();
    let recent_thread_errors = store.recent_thread_error_counts(thresholds.error_cluster_window);
    let first = engine.evaluate(&status, &recent_thread_errors, &projection.policy_windows(), thresholds);
    let second = engine.evaluate(&status, &recent_thread_errors, &projection.policy_windows(), thresholds);

    assert_eq!(first, second);
    assert!(first.iter().any(|s| s.name == "deny_rate_critical"));
    assert!(first.iter().any(|s| s.name == "latency_p95_elevated"));
}

#[test]
fn s6_error_cluster_fires_from_a_single_threads_recent_window() {
    let mut events = Vec::new();
    for i in 1..=5i64 {
        events.push(json!({"index": i, "source": "gw", "artifact": "turn", "payload": {
            "thread_id": "T-quiet", "kind": "decision", "decision_result": "ALLOW",
        }}));
    }
    for i in 6..=9i64 {
        events.push(json!({"index": i, "source": "gw", "artifact": "turn", "payload": {
            "thread_id": "T-noisy", "kind": "error",
        }}));
    }

    let (store, projection) = ingest(serde_json::Value::Array(events));
    let status = projection.status();
    let engine = SignalEngine::new();
    let thresholds = SignalThresholds::default();
    let recent_thread_errors = store.recent_thread_error_counts(thresholds.error_cluster_window);

    assert!(recent_thread_errors.contains(&(ThreadId::new("T-noisy"), 4)));

    let signals = engine.evaluate(&status, &recent_thread_errors, &projection.policy_windows(), thresholds);
    let cluster = signals.iter().find(|s| s.name == "error_cluster").expect("error_cluster signal");
    assert!(cluster.observation.contains("T-noisy"));
}
