// src/projection/policy.rs
// ============================================================================
// Module: Policy Window
// Description: Ordered, non-overlapping windows of active policy versions.
// Purpose: Track when each policy_version was in effect, by event_id range.
// Dependencies: crate::identifiers
// ============================================================================

//! ## Overview
//! Windows are created and closed exclusively by `policy_change` events; at
//! most one window is open at a time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::identifiers::EventId;
use crate::identifiers::PolicyVersion;

// ============================================================================
// SECTION: Policy Window
// ============================================================================

/// One span during which a given `policy_version` was active.
///
/// # Invariants
/// - `ended_at_event_id` is `None` exactly while this is the open window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyWindow {
    /// The policy version active during this window.
    pub policy_version: PolicyVersion,
    /// The `event_id` of the `policy_change` event that opened this window.
    pub started_at_event_id: EventId,
    /// The `event_id` at which this window closed, or `None` if still open.
    pub ended_at_event_id: Option<EventId>,
}

impl PolicyWindow {
    /// Opens a new window starting at `event_id`.
    #[must_use]
    pub const fn open(policy_version: PolicyVersion, event_id: EventId) -> Self {
        Self {
            policy_version,
            started_at_event_id: event_id,
            ended_at_event_id: None,
        }
    }

    /// Returns `true` while this window has no closing `event_id`.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.ended_at_event_id.is_none()
    }
}
