//! # Attribute Values
//!
//! The dynamic value held by one named attribute of an entity. Values
//! serialize to their natural JSON shape (`10`, `"oak"`, `[1, 2]`,
//! `{"a": 1}`), maps keep their keys ordered so encoding is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value of a single entity attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
    /// Ordered list of values.
    List(Vec<AttributeValue>),
    /// Map of values, ordered by key.
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Returns the integer if this is an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float if this is a `Float` (or an `Int`, widened).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(v: Vec<AttributeValue>) -> Self {
        Self::List(v)
    }
}

impl From<BTreeMap<String, AttributeValue>> for AttributeValue {
    fn from(v: BTreeMap<String, AttributeValue>) -> Self {
        Self::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_json_shape() {
        let mut map = BTreeMap::new();
        map.insert("b".to_owned(), AttributeValue::from(2));
        map.insert("a".to_owned(), AttributeValue::from("x"));
        let value = AttributeValue::List(vec![
            AttributeValue::from(1),
            AttributeValue::from(0.5),
            AttributeValue::Map(map),
        ]);

        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[1,0.5,{"a":"x","b":2}]"#);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(AttributeValue::from(10).as_int(), Some(10));
        assert_eq!(AttributeValue::from(10).as_float(), Some(10.0));
        assert_eq!(AttributeValue::from("oak").as_str(), Some("oak"));
        assert_eq!(AttributeValue::from("oak").as_int(), None);
    }
}
