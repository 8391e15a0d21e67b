use sydata_result::Result;
use sydata_types::TypeTag;

use super::cache::SlotCache;
use crate::source::SourceRef;

/// List that reads lazily from its datasource and cannot be changed.
#[derive(Clone, Debug)]
pub struct ReadThroughList {
    cache: SlotCache,
}

impl ReadThroughList {
    pub(crate) fn new(source: SourceRef, content_type: TypeTag) -> Result<Self> {
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
}
