// src/digest.rs
// ============================================================================
// Module: Digester
// Description: Computes sha256 digests over canonical payload bytes.
// Purpose: Provide a stable, purely observational content digest.
// Dependencies: crate::canonical, sha2
// ============================================================================

//! ## Overview
//! `digest(payload) = "sha256:" + lowercase_hex(SHA-256(canonical_bytes(payload)))`.
//! The digest is never compared for authority; it exists only so operators
//! can confirm two observed payloads are byte-identical.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest as _;
use sha2::Sha256;

use crate::canonical::canonical_bytes;
use crate::payload::PayloadValue;

// ============================================================================
// SECTION: Digester
// ============================================================================

/// Computes `sha256:<lowercase-hex>` over the canonical encoding of `value`.
#[must_use]
pub fn digest(value: &PayloadValue) -> String {
    digest_bytes(&canonical_bytes(value))
}

/// Computes `sha256:<lowercase-hex>` over already-canonicalized bytes.
#[must_use]
pub fn digest_bytes(canonical: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical);
    let hash = hasher.finalize();
    let mut out = String::with_capacity(7 + hash.len() * 2);
    out.push_str("sha256:");
    for byte in hash {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
