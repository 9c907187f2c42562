// src/lib.rs
// ============================================================================
// Module: Gatewatch Library
// Description: Public API surface for the observation-only visibility layer.
// Purpose: Expose the event store, projection index, signal engine,
// canonicalization/digest/diagnostics pipeline, and ingest controller.
// Dependencies: crate::{canonical, digest, diagnostics, error, identifiers,
// ingest, model, payload, projection, signals, store}
// ============================================================================

//! ## Overview
//! `gatewatch` observes a decision-gateway's event stream and maintains
//! derived summaries, latency percentiles, and operator signals. It never
//! influences the gateway's behavior: every operation here is read-only
//! with respect to the decisions the gateway makes. The crate has no I/O of
//! its own; a caller (HTTP layer, CLI, or test harness) owns the
//! [`store::EventStore`] and [`projection::ProjectionIndex`] singletons and
//! feeds them through [`ingest::IngestController`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod canonical;
pub mod digest;
pub mod diagnostics;
pub mod error;
pub mod identifiers;
pub mod ingest;
pub mod model;
pub mod payload;
pub mod projection;
pub mod signals;
pub mod store;
pub mod trace;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use canonical::canon_len;
pub use canonical::canonical_bytes;
pub use digest::digest;
pub use digest::digest_bytes;
pub use diagnostics::DiagnosticsReport;
pub use diagnostics::TraceRecord;
pub use diagnostics::analyze as analyze_trace;

pub use error::CanonicalError;
pub use error::IngestError;
pub use error::QueryError;

pub use identifiers::Actor;
pub use identifiers::Artifact;
pub use identifiers::EventId;
pub use identifiers::PolicyVersion;
pub use identifiers::Source;
pub use identifiers::ThreadId;
pub use identifiers::TurnId;

pub use ingest::GatewaySnapshot;
pub use ingest::IngestController;
pub use ingest::IngestReport;

pub use model::DecisionResult;
pub use model::EventKind;
pub use model::ObservedEvent;
pub use model::WireEvent;

pub use payload::PayloadValue;

pub use projection::ActorSummary;
pub use projection::LatencyProfile;
pub use projection::LatencySnapshot;
pub use projection::PolicyWindow;
pub use projection::ProjectionIndex;
pub use projection::StatusSnapshot;
pub use projection::ThreadSummary;
pub use projection::TurnSummary;

pub use signals::Severity;
pub use signals::Signal;
pub use signals::SignalEngine;
pub use signals::SignalThresholds;

pub use store::EventStore;

pub use trace::WireTraceLine;
pub use trace::build_trace;
pub use trace::parse_raw_line;
pub use trace::parse_wire_line;
pub use trace::render_wire_line;
