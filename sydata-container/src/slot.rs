use std::fmt::Display;

use sydata_result::{Error, Result};
use sydata_types::TypeTag;
use tracing::trace;

use crate::container::Container;
use crate::factory::from_datasource;
use crate::source::SourceRef;

/// State of one element of a lazily loaded container.
#[derive(Clone, Debug)]
pub enum Slot<K, V = Container> {
    /// Present only in the datasource, under key `K`.
    Unmaterialized(K),
    /// Read from the datasource and unchanged since.
    Materialized(V),
    /// Present only in memory: added, replaced, or handed out mutably.
    CacheOnly(V),
}

impl<K, V> Slot<K, V> {
    pub fn value(&self) -> Option<&V> {
        match self {
            Slot::Unmaterialized(_) => None,
            Slot::Materialized(v) | Slot::CacheOnly(v) => Some(v),
        }
    }

    pub fn is_unmaterialized(&self) -> bool {
        matches!(self, Slot::Unmaterialized(_))
    }

    pub fn is_cache_only(&self) -> bool {
        matches!(self, Slot::CacheOnly(_))
    }
}

/// Read child `key` of `source` as a container of type `tag`.
pub(crate) fn load(source: Option<&SourceRef>, key: &str, tag: &TypeTag) -> Result<Container> {
    let source = source
        .ok_or_else(|| Error::Internal(format!("element '{key}' has no datasource")))?;
    trace!(key, tag = %tag, "materializing element");
    from_datasource(source.read_with_type(key, tag)?, tag)
}

impl<K: Display> Slot<K> {
    /// The value, read from `source` and memoized on first access.
    pub(crate) fn materialize(
        &mut self,
        source: Option<&SourceRef>,
        tag: &TypeTag,
    ) -> Result<&mut Container> {
        if let Slot::Unmaterialized(key) = self {
            let value = load(source, &key.to_string(), tag)?;
            *self = Slot::Materialized(value);
        }
        match self {
            Slot::Materialized(v) | Slot::CacheOnly(v) => Ok(v),
            Slot::Unmaterialized(_) => Err(Error::Internal("slot left unmaterialized".into())),
        }
    }

    /// The value for modification. The slot becomes cache-only.
    pub(crate) fn materialize_mut(
        &mut self,
        source: Option<&SourceRef>,
        tag: &TypeTag,
    ) -> Result<&mut Container> {
        match self {
            Slot::Unmaterialized(key) => {
                let value = load(source, &key.to_string(), tag)?;
                *self = Slot::CacheOnly(value);
            }
            Slot::Materialized(v) => {
                let value = std::mem::take(v);
                *self = Slot::CacheOnly(value);
            }
            Slot::CacheOnly(_) => {}
        }
        match self {
            Slot::CacheOnly(v) => Ok(v),
            _ => Err(Error::Internal("slot not cache-only after write access".into())),
        }
    }

    /// The value without memoizing it.
    pub(crate) fn peek(&self, source: Option<&SourceRef>, tag: &TypeTag) -> Result<Container> {
        match self {
            Slot::Unmaterialized(key) => load(source, &key.to_string(), tag),
            Slot::Materialized(v) | Slot::CacheOnly(v) => Ok(v.clone()),
        }
    }
}
