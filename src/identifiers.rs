// src/identifiers.rs
// ============================================================================
// Module: Observation Identifiers
// Description: Opaque identifiers for observed events, threads, turns, and
// actors.
// Purpose: Provide strongly typed, serializable wrappers around the opaque
// strings/integers the upstream gateway assigns.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers carried on [`crate::model::ObservedEvent`] are opaque: this
//! module wraps them in newtypes so call sites cannot accidentally compare a
//! `thread_id` against a `turn_id`, without adding any validation the spec
//! does not ask for.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Event Identifier
// ============================================================================

/// Monotonic 64-bit event identifier assigned by the upstream gateway.
///
/// # Invariants
/// - Used only as an ordering index; never reinterpreted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl EventId {
    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// ============================================================================
// SECTION: Opaque String Identifiers
// ============================================================================

/// Declares an opaque, string-backed identifier newtype.
///
/// # Invariants
/// - No normalization or validation is applied; values are compared and
///   hashed byte-for-byte.
macro_rules! opaque_string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

opaque_string_id!(ThreadId, "Opaque conversation/thread identifier.");
opaque_string_id!(TurnId, "Opaque turn identifier, unique within a thread.");
opaque_string_id!(Actor, "Opaque actor label (agent, user, service, ...).");
opaque_string_id!(PolicyVersion, "Opaque policy version label.");
opaque_string_id!(Source, "Opaque adapter label that produced an event.");
opaque_string_id!(Artifact, "Opaque artifact class label.");

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only panic-based assertions are permitted."
    )]
    use super::*;

    #[test]
    fn event_id_displays_as_raw_integer() {
        assert_eq!(EventId(42).to_string(), "42");
    }

    #[test]
    fn thread_id_round_trips_through_serde_as_bare_string() {
        let id = ThreadId::new("T1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"T1\"");
        let back: ThreadId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
