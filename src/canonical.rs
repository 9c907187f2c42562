// src/canonical.rs
// ============================================================================
// Module: Canonicalizer
// Description: Deterministic byte-exact canonical JSON encoding.
// Purpose: Give every payload a single, stable byte representation so digests
// and diagnostics are reproducible.
// Dependencies: crate::{error, payload}
// ============================================================================

//! ## Overview
//! The canonical form: object keys sorted by codepoint (already guaranteed
//! by [`PayloadValue::Object`]'s `BTreeMap`), no insignificant whitespace
//! (`,` and `:` only as separators), ASCII-only escaping of non-ASCII
//! characters, and integers emitted without a decimal point. Floats, `NaN`,
//! and `Infinity` cannot reach this encoder: [`PayloadValue`] rejects them
//! at construction (see [`crate::payload`]).

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::payload::PayloadValue;

// ============================================================================
// SECTION: Canonicalizer
// ============================================================================

/// Encodes a [`PayloadValue`] to canonical JSON bytes.
///
/// # Invariants
/// - Output is valid UTF-8.
/// - Encoding the same value twice yields byte-identical output.
#[must_use]
pub fn canonical_bytes(value: &PayloadValue) -> Vec<u8> {
    let mut out = String::new();
    write_value(value, &mut out);
    out.into_bytes()
}

/// Returns the byte length of the canonical encoding of `value`.
#[must_use]
pub fn canon_len(value: &PayloadValue) -> usize {
    canonical_bytes(value).len()
}

/// Appends the canonical encoding of `value` onto `out`.
fn write_value(value: &PayloadValue, out: &mut String) {
    match value {
        PayloadValue::Null => out.push_str("null"),
        PayloadValue::Bool(true) => out.push_str("true"),
        PayloadValue::Bool(false) => out.push_str("false"),
        PayloadValue::Int(i) => {
            out.push_str(&i.to_string());
        }
        PayloadValue::Str(s) => write_string(s, out),
        PayloadValue::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        PayloadValue::Object(map) => {
            out.push('{');
            for (index, (key, value)) in map.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(value, out);
            }
            out.push('}');
        }
    }
}

/// Writes a JSON string literal with ASCII-only escaping.
fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c if (c as u32) < 0x7f => out.push(c),
            c => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
        }
    }
    out.push('"');
}
