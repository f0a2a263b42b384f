//! The dynamic attribute map carried by every [`Operation`](crate::operation::Operation).
//!
//! Attribute values are a closed tagged variant (§9 "Dynamic attribute
//! map"); inserting anything else is rejected at the API boundary rather
//! than accepted and silently coerced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scalar or homogeneous-vector attribute value.
///
/// `BTreeMap` backs [`AttributeMap`] (not `HashMap`) so that JSON debug
/// output (§6) and op-shape comparisons in tests are deterministic across
/// runs — insertion order does not matter for attributes, only for
/// operands/results/operation iteration, which live elsewhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum AttributeValue {
    /// A boolean flag.
    #[serde(rename = "bool")]
    Bool(bool),
    /// A signed 64-bit integer.
    #[serde(rename = "i64")]
    Int(i64),
    /// A string, used for anything from a literal's text to a dotted hierarchical path.
    #[serde(rename = "str")]
    Str(String),
    /// A homogeneous vector of booleans.
    #[serde(rename = "vecBool")]
    VecBool(Vec<bool>),
    /// A homogeneous vector of integers.
    #[serde(rename = "vecI64")]
    VecInt(Vec<i64>),
    /// A homogeneous vector of strings.
    #[serde(rename = "vecStr")]
    VecStr(Vec<String>),
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Str(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Str(v.to_string())
    }
}

impl From<Vec<bool>> for AttributeValue {
    fn from(v: Vec<bool>) -> Self {
        AttributeValue::VecBool(v)
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(v: Vec<i64>) -> Self {
        AttributeValue::VecInt(v)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        AttributeValue::VecStr(v)
    }
}

impl AttributeValue {
    /// Returns the `bool` payload, if this value is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the `i64` payload, if this value is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the string payload, if this value is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the `Vec<String>` payload, if this value is a `VecStr`.
    pub fn as_vec_str(&self) -> Option<&[String]> {
        match self {
            AttributeValue::VecStr(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns the `Vec<i64>` payload, if this value is a `VecInt`.
    pub fn as_vec_int(&self) -> Option<&[i64]> {
        match self {
            AttributeValue::VecInt(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

/// An [`Operation`](crate::operation::Operation)'s attribute map: short string
/// keys to typed attribute values.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_conversions() {
        let v: AttributeValue = true.into();
        assert_eq!(v.as_bool(), Some(true));
        let v: AttributeValue = 42i64.into();
        assert_eq!(v.as_int(), Some(42));
        let v: AttributeValue = "hello".into();
        assert_eq!(v.as_str(), Some("hello"));
    }

    #[test]
    fn vector_conversions() {
        let v: AttributeValue = vec![1i64, 2, 3].into();
        assert_eq!(v.as_vec_int(), Some(&[1, 2, 3][..]));
        let v: AttributeValue = vec!["a".to_string(), "b".to_string()].into();
        assert_eq!(v.as_vec_str(), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[test]
    fn mismatched_accessor_returns_none() {
        let v: AttributeValue = 1i64.into();
        assert_eq!(v.as_bool(), None);
        assert_eq!(v.as_str(), None);
    }

    #[test]
    fn json_roundtrip() {
        let map: AttributeMap = [
            ("width".to_string(), AttributeValue::Int(8)),
            ("init".to_string(), AttributeValue::VecStr(vec!["0".into()])),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&map).unwrap();
        let back: AttributeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }
}
