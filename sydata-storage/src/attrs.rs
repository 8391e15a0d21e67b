use bitcode::{Decode, Encode};
use sydata_result::{Error, Result};

use crate::constants::MAX_ATTRIBUTE_BYTES;
use crate::file::StoreFile;
use crate::types::PhysicalKey;

/// Value of a node attribute.
///
/// Text is carried as `Bytes`; interpreting it is left to the caller.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl AttrValue {
    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        bitcode::encode(self).len()
    }

    /// Reject values above the compact attribute limit.
    pub(crate) fn check_size(&self, key: &str) -> Result<()> {
        let len = self.encoded_len();
        if len > MAX_ATTRIBUTE_BYTES {
            return Err(Error::InvalidArgumentError(format!(
                "attribute '{key}' is {len} bytes, limit is {MAX_ATTRIBUTE_BYTES}"
            )));
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i64]> {
        match self {
            AttrValue::IntArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Bytes(s.as_bytes().to_vec())
    }
}

/// Attribute access shared by groups and datasets.
///
/// Keys iterate in lexicographic order.
pub trait Attributes {
    /// File and node key that own the attributes.
    fn attr_owner(&self) -> (&StoreFile, PhysicalKey);

    fn attr(&self, key: &str) -> Result<Option<AttrValue>> {
        let (file, pk) = self.attr_owner();
        Ok(file.load_node(pk)?.attrs.get(key).cloned())
    }

    fn attr_keys(&self) -> Result<Vec<String>> {
        let (file, pk) = self.attr_owner();
        Ok(file.load_node(pk)?.attrs.keys().cloned().collect())
    }

    fn set_attr(&self, key: &str, value: AttrValue) -> Result<()> {
        value.check_size(key)?;
        let (file, pk) = self.attr_owner();
        file.update_node(pk, |node| {
            node.attrs.insert(key.to_string(), value);
            Ok(())
        })
    }

    /// Remove `key`, returning whether it was present.
    fn remove_attr(&self, key: &str) -> Result<bool> {
        let (file, pk) = self.attr_owner();
        if !file.load_node(pk)?.attrs.contains_key(key) {
            return Ok(false);
        }
        file.update_node(pk, |node| Ok(node.attrs.remove(key).is_some()))
    }
}
