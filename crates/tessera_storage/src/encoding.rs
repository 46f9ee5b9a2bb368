//! # Store Encoding
//!
//! Converts entity location and attribute values into the serialized form
//! handed to the backing store. Both encodings are JSON objects:
//!
//! ```text
//! location:  {"pos":[x,y,z],"orientation":[x,y,z,w]}   orientation only if valid
//! attribute: {"val":<value>}
//! ```
//!
//! Wrapping every attribute in the same `val` container lets the store treat
//! all attribute kinds as opaque blobs.

use serde::Serialize;
use tessera_core::{AttributeValue, Quaternion, Vector3};

use crate::error::{StorageError, StorageResult};

#[derive(Serialize)]
struct LocationBlob {
    pos: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    orientation: Option<[f64; 4]>,
}

#[derive(Serialize)]
struct ValueEnvelope<'a> {
    val: &'a AttributeValue,
}

/// Encodes position and (if defined) orientation into one location blob.
///
/// # Errors
///
/// Returns [`StorageError::Encode`] if serialization fails.
pub fn encode_location(position: Vector3, orientation: Option<Quaternion>) -> StorageResult<String> {
    let blob = LocationBlob {
        pos: position.to_array(),
        orientation: orientation.filter(|q| q.is_valid()).map(Quaternion::to_array),
    };
    serde_json::to_string(&blob).map_err(|e| StorageError::Encode {
        what: "location".to_owned(),
        reason: e.to_string(),
    })
}

/// Encodes a single attribute value wrapped as `{"val": value}`.
///
/// # Errors
///
/// Returns [`StorageError::Encode`] if serialization fails.
pub fn encode_attribute(name: &str, value: &AttributeValue) -> StorageResult<String> {
    serde_json::to_string(&ValueEnvelope { val: value }).map_err(|e| StorageError::Encode {
        what: format!("attribute {name}"),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_without_orientation() {
        let blob = encode_location(Vector3::new(1.0, 2.5, -3.0), None).unwrap();
        assert_eq!(blob, r#"{"pos":[1.0,2.5,-3.0]}"#);
    }

    #[test]
    fn test_location_with_orientation() {
        let blob = encode_location(Vector3::ZERO, Some(Quaternion::IDENTITY)).unwrap();
        assert_eq!(blob, r#"{"pos":[0.0,0.0,0.0],"orientation":[0.0,0.0,0.0,1.0]}"#);
    }

    #[test]
    fn test_invalid_orientation_is_omitted() {
        let blob = encode_location(Vector3::ZERO, Some(Quaternion::new(0.0, 0.0, 0.0, 0.0))).unwrap();
        assert_eq!(blob, r#"{"pos":[0.0,0.0,0.0]}"#);
    }

    #[test]
    fn test_attribute_envelope() {
        assert_eq!(encode_attribute("hp", &AttributeValue::from(10)).unwrap(), r#"{"val":10}"#);
        assert_eq!(
            encode_attribute("name", &AttributeValue::from("oak")).unwrap(),
            r#"{"val":"oak"}"#
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let value = AttributeValue::List(vec![AttributeValue::from(1), AttributeValue::from("a")]);
        let a = encode_attribute("x", &value).unwrap();
        let b = encode_attribute("x", &value).unwrap();
        assert_eq!(a, b);
    }
}
