// src/error.rs
// ============================================================================
// Module: Observation Errors
// Description: Error taxonomy for canonicalization, ingest, and query
// surfaces.
// Purpose: Centralize structured, programmatically matchable failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every fallible operation in this crate reports failures by return value;
//! nothing here aborts the process. Diagnostics and signals never fail (see
//! [`crate::diagnostics`] and [`crate::signals`]).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::identifiers::EventId;

// ============================================================================
// SECTION: Canonicalization Errors
// ============================================================================

/// Errors raised while canonicalizing a payload.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalError {
    /// A numeric leaf was not representable as a 64-bit integer.
    #[error("non-integer number in payload: {value}")]
    NonIntegerNumber {
        /// The offending number, rendered as written.
        value: String,
    },
    /// A numeric leaf was an integer but outside signed 64-bit range.
    #[error("integer out of 64-bit range in payload: {value}")]
    IntegerOutOfRange {
        /// The offending number, rendered as written.
        value: String,
    },
}

// ============================================================================
// SECTION: Ingest Errors
// ============================================================================

/// Errors raised while ingesting a gateway snapshot envelope.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `NonMonotonicIngest` is the only variant EventStore itself can raise;
///   the others are raised by envelope/event normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The envelope or a gateway event was structurally invalid.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The payload failed canonicalization.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalError),
    /// The event's `event_id` did not strictly increase over the last
    /// stored event.
    #[error("non-monotonic ingest: received {received}, last stored {last:?}")]
    NonMonotonicIngest {
        /// The `event_id` carried by the rejected event.
        received: EventId,
        /// The last stored `event_id`, or `None` when the store was empty.
        last: Option<EventId>,
    },
}

impl IngestError {
    /// Returns the stable error code used at the HTTP/CLI boundary.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Canonicalization(_) => "canonicalization_error",
            Self::NonMonotonicIngest {
                ..
            } => "non_monotonic_ingest",
        }
    }
}

// ============================================================================
// SECTION: Query Errors
// ============================================================================

/// Errors raised by the query surface (threads/turns lookups).
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The requested thread or turn identifier is unknown.
    #[error("not found: {0}")]
    NotFound(String),
}

impl QueryError {
    /// Returns the stable error code used at the HTTP boundary.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
        }
    }
}
