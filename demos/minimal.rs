// demos/minimal.rs
// ============================================================================
// Module: Gatewatch Minimal Example
// Description: Minimal end-to-end observation run using in-memory state.
// Purpose: Demonstrate ingest, projection snapshots, and signal evaluation.
// Dependencies: gatewatch, serde_json
// ============================================================================

//! ## Overview
//! Ingests a handful of gateway events for a single thread and prints the
//! resulting status snapshot and any tripped signals. This example is
//! backend-agnostic and suitable for quick verification.

use std::io::Write;

use gatewatch::EventStore;
use gatewatch::GatewaySnapshot;
use gatewatch::IngestController;
use gatewatch::ProjectionIndex;
use gatewatch::SignalEngine;
use gatewatch::SignalThresholds;
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = EventStore::new();
    let projection = ProjectionIndex::new();
    let controller = IngestController::new(&store, &projection);

    let snapshot = GatewaySnapshot::from_json(&json!({
        "events": [
            {"index": 1, "source": "gateway", "artifact": "turn", "payload": {
                "thread_id": "T1", "turn_id": "U1", "kind": "decision",
                "decision_result": "ALLOW", "latency_ms": 120,
            }},
            {"index": 2, "source": "gateway", "artifact": "turn", "payload": {
                "thread_id": "T1", "turn_id": "U1", "kind": "execution",
            }},
            {"index": 3, "source": "gateway", "artifact": "turn", "payload": {
                "thread_id": "T1", "turn_id": "U2", "kind": "decision",
                "decision_result": "DENY", "latency_ms": 2400,
            }},
            {"index": 4, "source": "gateway", "artifact": "turn", "payload": {
                "thread_id": "T1", "kind": "error",
            }},
        ],
    }))?;

    let report = controller.ingest_snapshot(&snapshot);
    write_line("Ingest", &format!("accepted {} of {}", report.accepted, snapshot.events.len()))?;

    let status = projection.status();
    write_line("Status", &format!("events={} threads={} deny_rate={:.2}", status.event_count, status.thread_count, status.deny_rate))?;

    let engine = SignalEngine::new();
    let thresholds = SignalThresholds::default();
    let recent_thread_errors = store.recent_thread_error_counts(thresholds.error_cluster_window);
    let signals = engine.evaluate(&status, &recent_thread_errors, &projection.policy_windows(), thresholds);
    if signals.is_empty() {
        write_line("Signals", "none")?;
    } else {
        for signal in &signals {
            write_line("Signal", &format!("{} [{:?}]: {}", signal.name, signal.severity, signal.observation))?;
        }
    }

    Ok(())
}

/// Writes a labeled line to stdout.
fn write_line(label: &str, value: &str) -> Result<(), std::io::Error> {
    let mut out = std::io::stdout();
    writeln!(out, "{label}: {value}")?;
    Ok(())
}
