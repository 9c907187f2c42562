// src/payload.rs
// ============================================================================
// Module: Observed Payload Values
// Description: JSON-safe dynamic value type carried on observed events.
// Purpose: Represent arbitrary gateway payloads without allowing floats, NaN,
// Infinity, or non-string object keys to enter the store.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Gateway payloads are arbitrary JSON trees, but this crate's contract
//! forbids floating-point leaves: every numeric leaf is a 64-bit integer.
//! [`PayloadValue`] is the tagged variant used everywhere a payload is
//! stored or canonicalized; object keys live in a [`BTreeMap`] so iteration
//! order is already codepoint-sorted ahead of canonicalization.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use serde_json::Value;

use crate::error::CanonicalError;

// ============================================================================
// SECTION: Payload Value
// ============================================================================

/// A JSON-safe value: null, bool, 64-bit integer, string, array, or an
/// object with string keys kept in codepoint order.
///
/// # Invariants
/// - Contains no floats, `NaN`, or `Infinity`.
/// - Object keys are always strings, stored sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadValue {
    // Variants below; `Serialize`/`Deserialize` are implemented by hand
    // against `serde_json::Value` so the float/NaN/Infinity rejection runs
    // on every deserialize, not just on explicit conversion.
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number, restricted to 64-bit integers.
    Int(i64),
    /// JSON string.
    Str(String),
    /// JSON array.
    Array(Vec<PayloadValue>),
    /// JSON object with codepoint-sorted string keys.
    Object(BTreeMap<String, PayloadValue>),
}

impl PayloadValue {
    /// Converts a [`serde_json::Value`] into a [`PayloadValue`], rejecting
    /// floats, non-finite numbers, and non-integer numeric leaves.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalError`] when the value contains a float or
    /// non-finite number. `serde_json::Value` object keys are always
    /// strings, so no non-string-key case can arise from this conversion.
    pub fn from_json(value: &Value) -> Result<Self, CanonicalError> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if n.as_u64().is_some() {
                    Err(CanonicalError::IntegerOutOfRange {
                        value: n.to_string(),
                    })
                } else {
                    Err(CanonicalError::NonIntegerNumber {
                        value: n.to_string(),
                    })
                }
            }
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Array(items) => {
                let converted =
                    items.iter().map(Self::from_json).collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Array(converted))
            }
            Value::Object(map) => {
                let mut converted = BTreeMap::new();
                for (key, value) in map {
                    converted.insert(key.clone(), Self::from_json(value)?);
                }
                Ok(Self::Object(converted))
            }
        }
    }

    /// Converts this value back into a [`serde_json::Value`] for embedding
    /// in a JSON document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            Self::Str(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }
}

// ============================================================================
// SECTION: Serde Bridge
// ============================================================================

impl Serialize for PayloadValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PayloadValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(D::Error::custom)
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
    use serde_json::json;

    use super::*;

    #[test]
    fn integers_convert_cleanly() {
        let value = PayloadValue::from_json(&json!({"a": 1, "b": [1, 2, 3]})).expect("convert");
        assert!(matches!(value, PayloadValue::Object(_)));
    }

    #[test]
    fn floats_are_rejected() {
        let err = PayloadValue::from_json(&json!(1.5)).unwrap_err();
        assert!(matches!(err, CanonicalError::NonIntegerNumber { .. }));
    }

    #[test]
    fn object_keys_are_sorted_by_codepoint() {
        let value = PayloadValue::from_json(&json!({"b": 1, "a": 2})).expect("convert");
        let PayloadValue::Object(map) = value else {
            panic!("expected object");
        };
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
