use std::ops::Range;

use sydata_result::{Error, Result};
use sydata_types::TypeTag;

use super::cache::SlotCache;
use super::List;
use crate::container::Container;
use crate::source::SourceRef;

/// Fully mutable list, optionally bound to a datasource for lazy reads.
#[derive(Clone, Debug)]
pub struct NormalList {
    cache: SlotCache,
}

impl NormalList {
    pub(crate) fn new(content_type: TypeTag) -> Self {
        Self {
            cache: SlotCache::unbound(content_type),
        }
    }

    pub(crate) fn bound(source: SourceRef, content_type: TypeTag) -> Result<Self> {
        Ok(Self {
            cache: SlotCache::bound(source, content_type)?,
        })
    }

    pub(crate) fn cache(&self) -> &SlotCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut SlotCache {
        &mut self.cache
    }

    pub(crate) fn append(&mut self, item: Container) -> Result<()> {
        self.cache.check_item(&item)?;
        self.cache.push(item);
        Ok(())
    }

    pub(crate) fn extend(&mut self, items: Vec<Container>) {
        for item in items {
            self.cache.push(item);
        }
    }

    pub(crate) fn set(&mut self, index: usize, item: Container) -> Result<()> {
        self.cache.set(index, item)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<Container> {
        self.cache.remove(index)
    }

    pub(crate) fn source_from(&mut self, items: Vec<Container>) {
        self.cache.replace_all(items);
    }
}

/// Materialize `range` of `cache` into a new unbound list.
pub(crate) fn slice_cache(cache: &mut SlotCache, range: Range<usize>) -> Result<List> {
    if range.end > cache.len() || range.start > range.end {
        return Err(Error::InvalidArgumentError(format!(
            "slice {range:?} out of range for list of length {}",
            cache.len()
        )));
    }
    let mut out = NormalList::new(cache.content_type().clone());
    for index in range {
        let value = cache.get_ref(index)?.clone();
        out.cache.push(value);
    }
    Ok(List::Normal(out))
}
