//! User-visible attributes.
//!
//! Text values are stored as UTF-8 bytes and decoded on read; byte values
//! that are not valid UTF-8 stay bytes. Reserved keys never cross this
//! boundary in either direction.

use std::collections::BTreeMap;

use sydata_result::Result;
use sydata_storage::{AttrValue, Attributes};
use tracing::debug;

use crate::reserved::is_reserved_key;

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
}

pub type AttributeMap = BTreeMap<String, AttributeValue>;

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<AttributeValue> for AttrValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Text(s) => AttrValue::Bytes(s.into_bytes()),
            AttributeValue::Int(v) => AttrValue::Int(v),
            AttributeValue::Float(v) => AttrValue::Float(v),
            AttributeValue::Bool(v) => AttrValue::Bool(v),
            AttributeValue::Bytes(b) => AttrValue::Bytes(b),
            AttributeValue::IntList(v) => AttrValue::IntArray(v),
            AttributeValue::FloatList(v) => AttrValue::FloatArray(v),
        }
    }
}

impl From<AttrValue> for AttributeValue {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => AttributeValue::Text(s),
                Err(e) => AttributeValue::Bytes(e.into_bytes()),
            },
            AttrValue::Int(v) => AttributeValue::Int(v),
            AttrValue::Float(v) => AttributeValue::Float(v),
            AttrValue::Bool(v) => AttributeValue::Bool(v),
            AttrValue::IntArray(v) => AttributeValue::IntList(v),
            AttrValue::FloatArray(v) => AttributeValue::FloatList(v),
        }
    }
}

/// Non-reserved attributes of `obj`.
pub fn read_user_attrs(obj: &impl Attributes) -> Result<AttributeMap> {
    let mut out = AttributeMap::new();
    for key in obj.attr_keys()? {
        if is_reserved_key(&key) {
            continue;
        }
        if let Some(value) = obj.attr(&key)? {
            out.insert(key, value.into());
        }
    }
    Ok(out)
}

/// Replace the non-reserved attributes of `obj` with `attrs`.
pub fn write_user_attrs(obj: &impl Attributes, attrs: &AttributeMap) -> Result<()> {
    for key in obj.attr_keys()? {
        if !is_reserved_key(&key) && !attrs.contains_key(&key) {
            obj.remove_attr(&key)?;
        }
    }
    for (key, value) in attrs {
        if is_reserved_key(key) {
            debug!(key, "skipping reserved attribute key");
            continue;
        }
        obj.set_attr(key, value.clone().into())?;
    }
    Ok(())
}

/// Text value of a reserved attribute, if present.
pub(crate) fn text_attr(obj: &impl Attributes, key: &str) -> Result<Option<String>> {
    Ok(match obj.attr(key)? {
        Some(AttrValue::Bytes(b)) => Some(String::from_utf8_lossy(&b).into_owned()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_goes_through_utf8_bytes() {
        let stored: AttrValue = AttributeValue::from("km/h").into();
        assert_eq!(stored, AttrValue::Bytes(b"km/h".to_vec()));
        assert_eq!(AttributeValue::from(stored), AttributeValue::from("km/h"));
    }

    #[test]
    fn invalid_utf8_stays_bytes() {
        let raw = AttrValue::Bytes(vec![0xff, 0x00]);
        assert_eq!(
            AttributeValue::from(raw),
            AttributeValue::Bytes(vec![0xff, 0x00])
        );
    }
}
