use std::collections::BTreeSet;

use sydata_result::{Error, Result};
use sydata_types::TypeTag;
use tracing::debug;

use crate::container::Container;
use crate::factory::from_type;
use crate::slot::Slot;
use crate::source::SourceRef;
use crate::writeback::{Tally, placement, write_slot};

/// Fixed set of typed slots shared by records and tuples.
#[derive(Clone, Debug)]
pub(crate) struct FixedSlots {
    keys: Vec<String>,
    tags: Vec<TypeTag>,
    source: Option<SourceRef>,
    slots: Vec<Slot<String>>,
}

impl FixedSlots {
    /// Every slot filled with an empty value of its type.
    pub(crate) fn fresh(keys: Vec<String>, tags: Vec<TypeTag>) -> Result<Self> {
        let slots = tags
            .iter()
            .map(|tag| from_type(tag).map(Slot::CacheOnly))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            keys,
            tags,
            source: None,
            slots,
        })
    }

    /// Bind to `source`. Fields it does not hold yet start empty.
    pub(crate) fn bound(source: SourceRef, keys: Vec<String>, tags: Vec<TypeTag>) -> Result<Self> {
        let present: BTreeSet<String> = source.keys()?.into_iter().collect();
        let slots = keys
            .iter()
            .zip(&tags)
            .map(|(key, tag)| {
                if present.contains(key) {
                    Ok(Slot::Unmaterialized(key.clone()))
                } else {
                    from_type(tag).map(Slot::CacheOnly)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            keys,
            tags,
            source: Some(source),
            slots,
        })
    }

    pub(crate) fn keys(&self) -> &[String] {
        &self.keys
    }

    pub(crate) fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    pub(crate) fn source(&self) -> Option<&SourceRef> {
        self.source.as_ref()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.slots.len() {
            return Err(Error::not_found(format!(
                "slot {index} of {}",
                self.slots.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn get_ref(&mut self, index: usize) -> Result<&Container> {
        self.check_index(index)?;
        let value = self.slots[index].materialize(self.source.as_ref(), &self.tags[index])?;
        Ok(value)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Result<&mut Container> {
        self.check_index(index)?;
        self.slots[index].materialize_mut(self.source.as_ref(), &self.tags[index])
    }

    pub(crate) fn set(&mut self, index: usize, item: Container) -> Result<()> {
        self.check_index(index)?;
        let actual = item.type_tag();
        if !self.tags[index].accepts(&actual) {
            return Err(Error::content_type_mismatch(&self.tags[index], actual));
        }
        self.slots[index] = Slot::CacheOnly(item);
        Ok(())
    }

    pub(crate) fn is_modified(&self) -> bool {
        self.source.is_none() || self.slots.iter().any(Slot::is_cache_only)
    }

    pub(crate) fn writeback(&mut self, target: &SourceRef) -> Result<()> {
        let placement = placement(self.source.as_ref(), target);
        let mut tally = Tally::default();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            write_slot(
                slot,
                self.source.as_ref(),
                target,
                &self.keys[index],
                &self.tags[index],
                placement,
                &mut tally,
            )?;
        }
        debug!(
            target = %target.identity(),
            linked = tally.linked,
            copied = tally.copied,
            kept = tally.kept,
            "wrote back fixed slots"
        );
        Ok(())
    }

    pub(crate) fn detach(&mut self) -> Result<()> {
        for (slot, tag) in self.slots.iter_mut().zip(&self.tags) {
            slot.materialize_mut(self.source.as_ref(), tag)?.detach()?;
        }
        self.source = None;
        Ok(())
    }
}
