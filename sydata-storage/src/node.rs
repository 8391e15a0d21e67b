//! Persistent node records.
//!
//! Every object in a file (group or dataset) is one `bitcode`-encoded [`Node`]
//! at its own physical key. Dataset payloads live at a separate key so node
//! metadata can be read without touching the data.

use std::collections::BTreeMap;

use bitcode::{Decode, Encode};
use sydata_result::{Error, Result};

use crate::attrs::AttrValue;
use crate::filters::FilterPipeline;
use crate::types::PhysicalKey;

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Node {
    /// Number of hard links naming this node. The node and everything it
    /// owns is freed when this drops to zero.
    pub links: u32,
    pub attrs: BTreeMap<String, AttrValue>,
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum NodeKind {
    /// Children iterate in lexicographic order.
    Group { children: BTreeMap<String, Link> },
    Dataset(DatasetInfo),
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct DatasetInfo {
    pub prim_code: u8,
    pub len: u64,
    pub shape: Shape,
    pub filters: FilterPipeline,
    pub payload_pk: PhysicalKey,
    pub raw_bytes: u64,
    pub stored_bytes: u64,
}

/// Dimensionality of a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum Shape {
    /// 0-dimensional: a single value.
    Scalar,
    /// 1-dimensional.
    Vector,
}

/// Entry in a group's child table.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub enum Link {
    /// Node in the same file.
    Hard(PhysicalKey),
    /// Object at `path` inside the file at `file`.
    External { file: String, path: String },
}

impl Node {
    pub fn empty_group() -> Self {
        Node {
            links: 1,
            attrs: BTreeMap::new(),
            kind: NodeKind::Group {
                children: BTreeMap::new(),
            },
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    pub fn children(&self) -> Result<&BTreeMap<String, Link>> {
        match &self.kind {
            NodeKind::Group { children } => Ok(children),
            NodeKind::Dataset(_) => Err(Error::InvalidArgumentError(
                "node is a dataset, not a group".into(),
            )),
        }
    }

    pub fn children_mut(&mut self) -> Result<&mut BTreeMap<String, Link>> {
        match &mut self.kind {
            NodeKind::Group { children } => Ok(children),
            NodeKind::Dataset(_) => Err(Error::InvalidArgumentError(
                "node is a dataset, not a group".into(),
            )),
        }
    }

    pub fn dataset(&self) -> Result<&DatasetInfo> {
        match &self.kind {
            NodeKind::Dataset(info) => Ok(info),
            NodeKind::Group { .. } => Err(Error::InvalidArgumentError(
                "node is a group, not a dataset".into(),
            )),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        bitcode::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bitcode::decode(bytes).map_err(Error::codec)
    }
}
