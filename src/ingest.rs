// src/ingest.rs
// ============================================================================
// Module: Ingest Controller
// Description: Normalizes a gateway snapshot envelope into ObservedEvents
// and drives EventStore + ProjectionIndex together, one event at a time.
// Purpose: Give the upstream gateway feed a single entry point with
// partial-batch semantics.
// Dependencies: crate::{error, identifiers, model, payload, projection,
// store}, serde_json
// ============================================================================

//! ## Overview
//! [`IngestController::ingest_snapshot`] processes a gateway snapshot
//! envelope's `events` array in order. On the first invalid item it halts
//! and reports how many events were accepted before the failure; every
//! successful append and projection update up to that point is retained
//! (ingest is a sequence of individually committed steps, not a
//! transaction).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::error::IngestError;
use crate::identifiers::Actor;
use crate::identifiers::Artifact;
use crate::identifiers::EventId;
use crate::identifiers::PolicyVersion;
use crate::identifiers::Source;
use crate::identifiers::ThreadId;
use crate::identifiers::TurnId;
use crate::model::DecisionResult;
use crate::model::EventKind;
use crate::model::ObservedEvent;
use crate::payload::PayloadValue;
use crate::projection::ProjectionIndex;
use crate::store::EventStore;

// ============================================================================
// SECTION: Gateway Snapshot Envelope
// ============================================================================

/// A gateway snapshot envelope: `{ events: [...], offset?, limit? }`.
///
/// # Invariants
/// - `events` is processed in array order.
/// - `offset`/`limit` are opaque paging metadata forwarded by the caller;
///   this controller does not slice `events` by them.
#[derive(Debug, Clone, Default)]
pub struct GatewaySnapshot {
    /// Gateway events, in the order they should be ingested.
    pub events: Vec<Value>,
    /// Opaque paging offset, if supplied by the caller.
    pub offset: Option<u64>,
    /// Opaque paging limit, if supplied by the caller.
    pub limit: Option<u64>,
}

/// Top-level keys recognized on a gateway snapshot envelope.
const ENVELOPE_FIELDS: [&str; 3] = ["events", "offset", "limit"];

impl GatewaySnapshot {
    /// Parses a gateway snapshot envelope from a JSON value, rejecting any
    /// top-level key outside `events`/`offset`/`limit`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidInput`] when `value` is not an object,
    /// carries an unknown top-level key, or `events` is present but not an
    /// array.
    pub fn from_json(value: &Value) -> Result<Self, IngestError> {
        let object = value.as_object().ok_or_else(|| IngestError::InvalidInput("gateway snapshot envelope must be a JSON object".to_string()))?;

        if let Some(unknown) = object.keys().find(|key| !ENVELOPE_FIELDS.contains(&key.as_str())) {
            return Err(IngestError::InvalidInput(format!("unknown envelope field \"{unknown}\"")));
        }

        let events = match object.get("events") {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(IngestError::InvalidInput("envelope \"events\" must be an array".to_string())),
            None => Vec::new(),
        };
        let offset = object.get("offset").and_then(Value::as_u64);
        let limit = object.get("limit").and_then(Value::as_u64);

        Ok(Self {
            events,
            offset,
            limit,
        })
    }
}

// ============================================================================
// SECTION: Ingest Report
// ============================================================================

/// Outcome of processing one [`GatewaySnapshot`].
///
/// # Invariants
/// - `rejected_at` and `reason` are both `Some` or both `None`.
/// - `accepted` equals `rejected_at` when a rejection occurred, and
///   `events.len()` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of gateway events successfully appended and projected.
    pub accepted: usize,
    /// Index within `events` of the first rejected item, if any.
    pub rejected_at: Option<usize>,
    /// Reason the item at `rejected_at` was rejected.
    pub reason: Option<IngestError>,
}

impl IngestReport {
    /// Returns `true` when every gateway event in the batch was accepted.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.rejected_at.is_none()
    }
}

// ============================================================================
// SECTION: Ingest Controller
// ============================================================================

/// Drives one [`EventStore`] and one [`ProjectionIndex`] from gateway
/// snapshot envelopes, keeping them consistent with each other.
///
/// # Invariants
/// - For every accepted gateway event, the matching `EventStore::append`
///   and `ProjectionIndex::on_event` happen together before the next item
///   is processed.
#[derive(Debug)]
pub struct IngestController<'a> {
    store: &'a EventStore,
    projection: &'a ProjectionIndex,
}

impl<'a> IngestController<'a> {
    /// Creates a controller over the given store and projection index.
    #[must_use]
    pub const fn new(store: &'a EventStore, projection: &'a ProjectionIndex) -> Self {
        Self {
            store,
            projection,
        }
    }

    /// Processes `snapshot.events` in array order, halting on the first
    /// invalid item.
    pub fn ingest_snapshot(&self, snapshot: &GatewaySnapshot) -> IngestReport {
        for (index, raw_event) in snapshot.events.iter().enumerate() {
            let event = match normalize_gateway_event(raw_event) {
                Ok(event) => event,
                Err(reason) => {
                    return IngestReport {
                        accepted: index,
                        rejected_at: Some(index),
                        reason: Some(reason),
                    };
                }
            };

            if let Err(reason) = self.store.append(event.clone()) {
                return IngestReport {
                    accepted: index,
                    rejected_at: Some(index),
                    reason: Some(reason),
                };
            }
            self.projection.on_event(&event);
        }

        IngestReport {
            accepted: snapshot.events.len(),
            rejected_at: None,
            reason: None,
        }
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes one gateway event value into an [`ObservedEvent`].
///
/// Expects an object carrying `index` (the event_id), `source`, `artifact`,
/// and a `payload` object. Recognized fields inside `payload`
/// (`thread_id`, `turn_id`, `parent_turn_id`, `actor`, `kind`,
/// `decision_result`, `policy_version`, `latency_ms`, `observed_at`) are
/// extracted into the typed fields of [`ObservedEvent`]; the full payload
/// object, recognized fields included, is retained verbatim as
/// [`ObservedEvent::payload`].
///
/// # Errors
///
/// Returns [`IngestError::InvalidInput`] when the event is not an object or
/// is missing `index`, `source`, `artifact`, or `payload`; returns
/// [`IngestError::Canonicalization`] when the payload contains a float or
/// non-finite number.
fn normalize_gateway_event(value: &Value) -> Result<ObservedEvent, IngestError> {
    let object = value.as_object().ok_or_else(|| IngestError::InvalidInput("gateway event must be a JSON object".to_string()))?;

    let event_id = object
        .get("index")
        .and_then(Value::as_i64)
        .map(EventId)
        .ok_or_else(|| IngestError::InvalidInput("gateway event missing integer \"index\"".to_string()))?;

    let source = object
        .get("source")
        .and_then(Value::as_str)
        .map(Source::new)
        .ok_or_else(|| IngestError::InvalidInput("gateway event missing \"source\"".to_string()))?;

    let artifact = object
        .get("artifact")
        .and_then(Value::as_str)
        .map(Artifact::new)
        .ok_or_else(|| IngestError::InvalidInput("gateway event missing \"artifact\"".to_string()))?;

    let payload_value = object.get("payload").ok_or_else(|| IngestError::InvalidInput("gateway event missing \"payload\"".to_string()))?;
    let payload_object = payload_value.as_object();

    let thread_id = payload_object.and_then(|p| p.get("thread_id")).and_then(Value::as_str).map(ThreadId::new);
    let turn_id = payload_object.and_then(|p| p.get("turn_id")).and_then(Value::as_str).map(TurnId::new);
    let parent_turn_id = payload_object.and_then(|p| p.get("parent_turn_id")).and_then(Value::as_str).map(TurnId::new);
    let actor = payload_object.and_then(|p| p.get("actor")).and_then(Value::as_str).map(Actor::new);
    let kind = payload_object.and_then(|p| p.get("kind")).and_then(Value::as_str).map_or(EventKind::Other, parse_kind);
    let decision_result = payload_object.and_then(|p| p.get("decision_result")).and_then(Value::as_str).and_then(parse_decision_result);
    let policy_version = payload_object.and_then(|p| p.get("policy_version")).and_then(Value::as_str).map(PolicyVersion::new);
    let latency_ms = payload_object.and_then(|p| p.get("latency_ms")).and_then(Value::as_u64);
    let observed_at = payload_object.and_then(|p| p.get("observed_at")).and_then(Value::as_i64).unwrap_or(0);

    let payload = PayloadValue::from_json(payload_value)?;

    Ok(ObservedEvent {
        event_id,
        source,
        artifact,
        thread_id,
        turn_id,
        parent_turn_id,
        actor,
        kind,
        decision_result,
        policy_version,
        latency_ms,
        observed_at,
        payload,
    })
}

fn parse_kind(raw: &str) -> EventKind {
    match raw.to_ascii_lowercase().as_str() {
        "decision" => EventKind::Decision,
        "execution" => EventKind::Execution,
        "error" => EventKind::Error,
        "policy_change" => EventKind::PolicyChange,
        _ => EventKind::Other,
    }
}

fn parse_decision_result(raw: &str) -> Option<DecisionResult> {
    match raw.to_ascii_lowercase().as_str() {
        "allow" => Some(DecisionResult::Allow),
        "deny" => Some(DecisionResult::Deny),
        _ => None,
    }
}
