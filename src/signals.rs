// src/signals.rs
// ============================================================================
// Module: Signal Engine
// Description: Stateless derivation of operator-facing signals from a
// projection snapshot and configurable thresholds.
// Purpose: Turn raw counters into named, severity-ranked observations.
// Dependencies: crate::projection
// ============================================================================

//! ## Overview
//! [`SignalEngine::evaluate`] is a pure function: identical
//! `(status, threads, policy_windows, thresholds)` input always produces the
//! identical `Vec<Signal>` output, in the same order. The signal name
//! vocabulary is fixed; only the thresholds that trip each rule are
//! configurable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::identifiers::ThreadId;
use crate::projection::PolicyWindow;
use crate::projection::StatusSnapshot;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Severity level attached to a [`Signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational; no action implied.
    Info,
    /// Worth attention but not urgent.
    Warn,
    /// Requires immediate attention.
    Critical,
}

// ============================================================================
// SECTION: Signal
// ============================================================================

/// One derived observation about the current projection state.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Fixed rule name (e.g. `latency_p95_elevated`).
    pub name: &'static str,
    /// Severity of this signal.
    pub severity: Severity,
    /// Human-readable description of what was observed.
    pub observation: String,
    /// The raw numbers that tripped the rule.
    pub evidence: Vec<(&'static str, f64)>,
}

// ============================================================================
// SECTION: Thresholds
// ============================================================================

/// Configurable thresholds governing when each signal rule trips.
///
/// # Invariants
/// - None of these are hard-coded invariants of the engine itself; only the
///   rule vocabulary is fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    /// P95 latency (ms) at or above which `latency_p95_elevated` trips.
    pub latency_warn_ms: u64,
    /// P95 latency (ms) at or above which `latency_p95_critical` trips.
    pub latency_critical_ms: u64,
    /// Minimum latency sample count required before latency signals fire.
    pub latency_min_count: usize,
    /// Deny rate at or above which `deny_rate_elevated` trips.
    pub deny_rate_warn: f64,
    /// Deny rate at or above which `deny_rate_critical` trips.
    pub deny_rate_critical: f64,
    /// Minimum decision count required before deny-rate signals fire.
    pub deny_rate_min_count: u64,
    /// Per-thread error count, within its last `error_cluster_window`
    /// events, at or above which `error_cluster` trips.
    pub error_cluster_thread_threshold: u64,
    /// Window size (in events) used to evaluate the per-thread error
    /// cluster rule.
    pub error_cluster_window: u64,
    /// Total error count at or above which `error_cluster` trips, regardless
    /// of per-thread distribution.
    pub error_cluster_total_threshold: u64,
    /// Policy window count within the trailing window at or above which
    /// `frequent_policy_changes` trips.
    pub frequent_policy_change_count: usize,
    /// Trailing event window (count of most recent policy windows
    /// considered) used to evaluate the frequent-policy-change rule.
    pub frequent_policy_change_window: usize,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            latency_warn_ms: 500,
            latency_critical_ms: 2000,
            latency_min_count: 50,
            deny_rate_warn: 0.25,
            deny_rate_critical: 0.5,
            deny_rate_min_count: 20,
            error_cluster_thread_threshold: 3,
            error_cluster_window: 20,
            error_cluster_total_threshold: 10,
            frequent_policy_change_count: 3,
            frequent_policy_change_window: 100,
        }
    }
}

// ============================================================================
// SECTION: Signal Engine
// ============================================================================

/// Stateless derivation of [`Signal`]s from a projection snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalEngine;

impl SignalEngine {
    /// Creates a new engine. The engine holds no state; this exists only for
    /// API symmetry with the other components.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluates all signal rules against a projection snapshot.
    ///
    /// `recent_thread_errors` gives, for the error-cluster rule, each
    /// thread's error count restricted to its last `error_cluster_window`
    /// events (the caller owns windowing since the engine is given only
    /// snapshot aggregates, not the raw event sequence).
    #[must_use]
    pub fn evaluate(
        &self,
        status: &StatusSnapshot,
        recent_thread_errors: &[(ThreadId, u64)],
        policy_windows: &[PolicyWindow],
        thresholds: SignalThresholds,
    ) -> Vec<Signal> {
        let mut signals = Vec::new();

        if let Some(signal) = Self::latency_signal(status, thresholds) {
            signals.push(signal);
        }
        if let Some(signal) = Self::deny_rate_signal(status, thresholds) {
            signals.push(signal);
        }
        if let Some(signal) = Self::error_cluster_signal(status, recent_thread_errors, thresholds) {
            signals.push(signal);
        }
        if let Some(signal) = Self::frequent_policy_change_signal(status, policy_windows, thresholds) {
            signals.push(signal);
        }

        signals
    }

    fn latency_signal(status: &StatusSnapshot, thresholds: SignalThresholds) -> Option<Signal> {
        if status.latency.count < thresholds.latency_min_count {
            return None;
        }
        let p95 = status.latency.p95?;

        #[allow(clippy::cast_precision_loss, reason = "latency milliseconds fit comfortably in f64 precision")]
        let evidence = vec![("p95_ms", p95 as f64), ("count", status.latency.count as f64)];

        if p95 >= thresholds.latency_critical_ms {
            Some(Signal {
                name: "latency_p95_critical",
                severity: Severity::Critical,
                observation: format!("p95 latency {p95}ms exceeds critical threshold {}ms", thresholds.latency_critical_ms),
                evidence,
            })
        } else if p95 >= thresholds.latency_warn_ms {
            Some(Signal {
                name: "latency_p95_elevated",
                severity: Severity::Warn,
                observation: format!("p95 latency {p95}ms exceeds warning threshold {}ms", thresholds.latency_warn_ms),
                evidence,
            })
        } else {
            None
        }
    }

    fn deny_rate_signal(status: &StatusSnapshot, thresholds: SignalThresholds) -> Option<Signal> {
        if status.decision_count < thresholds.deny_rate_min_count {
            return None;
        }
        let evidence = vec![("deny_rate", status.deny_rate), ("decision_count", status.decision_count as f64)];

        if status.deny_rate >= thresholds.deny_rate_critical {
            Some(Signal {
                name: "deny_rate_critical",
                severity: Severity::Critical,
                observation: format!("deny rate {:.2} exceeds critical threshold {:.2}", status.deny_rate, thresholds.deny_rate_critical),
                evidence,
            })
        } else if status.deny_rate >= thresholds.deny_rate_warn {
            Some(Signal {
                name: "deny_rate_elevated",
                severity: Severity::Warn,
                observation: format!("deny rate {:.2} exceeds warning threshold {:.2}", status.deny_rate, thresholds.deny_rate_warn),
                evidence,
            })
        } else {
            None
        }
    }

    fn error_cluster_signal(
        status: &StatusSnapshot,
        recent_thread_errors: &[(ThreadId, u64)],
        thresholds: SignalThresholds,
    ) -> Option<Signal> {
        let clustered = recent_thread_errors
            .iter()
            .find(|(_, count)| *count >= thresholds.error_cluster_thread_threshold);

        if let Some((thread_id, count)) = clustered {
            return Some(Signal {
                name: "error_cluster",
                severity: Severity::Warn,
                observation: format!("thread {thread_id} observed {count} errors within its last {} events", thresholds.error_cluster_window),
                evidence: vec![("thread_error_count", *count as f64), ("window", thresholds.error_cluster_window as f64)],
            });
        }

        if status.error_count >= thresholds.error_cluster_total_threshold {
            return Some(Signal {
                name: "error_cluster",
                severity: Severity::Warn,
                observation: format!("total error count {} exceeds threshold {}", status.error_count, thresholds.error_cluster_total_threshold),
                evidence: vec![("total_error_count", status.error_count as f64)],
            });
        }

        None
    }

    /// Counts `policy_change` events whose `started_at_event_id` falls
    /// within the trailing `frequent_policy_change_window` event_ids ending
    /// at `status.latest_event_id`, per spec §4.6 ("PolicyWindow count
    /// within the last 100 events"). Windowing by event span rather than by
    /// raw window count avoids firing on policy changes that happened long
    /// ago in event-id terms just because few policy windows exist overall.
    fn frequent_policy_change_signal(status: &StatusSnapshot, policy_windows: &[PolicyWindow], thresholds: SignalThresholds) -> Option<Signal> {
        let latest = status.latest_event_id?;
        #[allow(clippy::cast_possible_wrap, reason = "window sizes are small positive configuration values")]
        let window_span = thresholds.frequent_policy_change_window as i64;
        let cutoff = latest.get().saturating_sub(window_span);
        let recent_count = policy_windows.iter().filter(|window| window.started_at_event_id.get() > cutoff).count();

        if recent_count < thresholds.frequent_policy_change_count {
            return None;
        }

        let evidence = vec![("policy_change_count", recent_count as f64)];

        Some(Signal {
            name: "frequent_policy_changes",
            severity: Severity::Info,
            observation: format!("{recent_count} policy changes observed within the last {} events", thresholds.frequent_policy_change_window),
            evidence,
        })
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
    use super::*;
    use crate::identifiers::EventId;
    use crate::identifiers::PolicyVersion;
    use crate::projection::LatencySnapshot;

    fn status_with(decision_count: u64, deny_count: u64, p95: Option<u64>, latency_count: usize) -> StatusSnapshot {
        status_with_latest_event_id(decision_count, deny_count, p95, latency_count, None)
    }

    fn status_with_latest_event_id(
        decision_count: u64,
        deny_count: u64,
        p95: Option<u64>,
        latency_count: usize,
        latest_event_id: Option<EventId>,
    ) -> StatusSnapshot {
        StatusSnapshot {
            event_count: decision_count,
            thread_count: 0,
            turn_count: 0,
            decision_count,
            allow_count: decision_count - deny_count,
            deny_count,
            error_count: 0,
            deny_rate: if decision_count == 0 { 0.0 } else { deny_count as f64 / decision_count as f64 },
            latency: LatencySnapshot {
                count: latency_count,
                p50: p95,
                p95,
                p99: p95,
            },
            latest_event_id,
        }
    }

    #[test]
    fn latency_signal_respects_minimum_count() {
        let status = status_with(0, 0, Some(3000), 10);
        let engine = SignalEngine::new();
        let signals = engine.evaluate(&status, &[], &[], SignalThresholds::default());
        assert!(signals.is_empty());
    }

    #[test]
    fn latency_critical_fires_above_threshold_with_enough_samples() {
        let status = status_with(0, 0, Some(3000), 50);
        let engine = SignalEngine::new();
        let signals = engine.evaluate(&status, &[], &[], SignalThresholds::default());
        assert!(signals.iter().any(|s| s.name == "latency_p95_critical"));
    }

    #[test]
    fn deny_rate_elevated_requires_minimum_decisions() {
        let status = status_with(5, 4, None, 0);
        let engine = SignalEngine::new();
        let signals = engine.evaluate(&status, &[], &[], SignalThresholds::default());
        assert!(signals.is_empty());
    }

    #[test]
    fn frequent_policy_changes_counts_within_window() {
        let windows: Vec<PolicyWindow> = (1..=3)
            .map(|i| PolicyWindow::open(PolicyVersion::new(format!("v{i}")), EventId(i)))
            .collect();
        let status = status_with_latest_event_id(0, 0, None, 0, Some(EventId(3)));
        let engine = SignalEngine::new();
        let signals = engine.evaluate(&status, &[], &windows, SignalThresholds::default());
        assert!(signals.iter().any(|s| s.name == "frequent_policy_changes"));
    }

    #[test]
    fn frequent_policy_changes_ignores_windows_outside_the_trailing_event_span() {
        // Three policy changes at event_ids 1/2/3, then thousands of
        // unrelated events. None of the windows fall within the last 100
        // event_ids ending at the latest observed event, so the signal must
        // not fire even though exactly 3 policy windows exist overall.
        let windows: Vec<PolicyWindow> = (1..=3)
            .map(|i| PolicyWindow::open(PolicyVersion::new(format!("v{i}")), EventId(i)))
            .collect();
        let status = status_with_latest_event_id(0, 0, None, 0, Some(EventId(5000)));
        let engine = SignalEngine::new();
        let signals = engine.evaluate(&status, &[], &windows, SignalThresholds::default());
        assert!(!signals.iter().any(|s| s.name == "frequent_policy_changes"));
    }
}
