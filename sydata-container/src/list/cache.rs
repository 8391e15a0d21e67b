use sydata_result::{Error, Result};
use sydata_types::TypeTag;
use tracing::debug;

use crate::container::Container;
use crate::slot::Slot;
use crate::source::SourceRef;
use crate::writeback::{Placement, Tally, placement, write_slot};

/// Slots of a list bound to an optional datasource.
///
/// Backing index `i` is read at most once; after that the slot holds the
/// materialized value.
#[derive(Clone, Debug)]
pub(crate) struct SlotCache {
    content_type: TypeTag,
    source: Option<SourceRef>,
    slots: Vec<Slot<usize>>,
    /// Elements in the datasource when bound.
    bound_len: usize,
    /// Whether any of those elements was moved or replaced.
    dirty: bool,
}

impl SlotCache {
    pub(crate) fn unbound(content_type: TypeTag) -> Self {
        Self {
            content_type,
            source: None,
            slots: Vec::new(),
            bound_len: 0,
            dirty: false,
        }
    }

    /// Bind to `source`. Only its size is read.
    pub(crate) fn bound(source: SourceRef, content_type: TypeTag) -> Result<Self> {
        let len = source.size()?;
        Ok(Self {
            content_type,
            source: Some(source),
            slots: (0..len).map(Slot::Unmaterialized).collect(),
            bound_len: len,
            dirty: false,
        })
    }

    pub(crate) fn content_type(&self) -> &TypeTag {
        &self.content_type
    }

    pub(crate) fn source(&self) -> Option<&SourceRef> {
        self.source.as_ref()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(Error::InvalidArgumentError(format!(
                "index {index} out of range for list of length {}",
                self.slots.len()
            )))
        }
    }

    pub(crate) fn check_item(&self, item: &Container) -> Result<()> {
        let actual = item.type_tag();
        if self.content_type.accepts(&actual) {
            Ok(())
        } else {
            Err(Error::content_type_mismatch(&self.content_type, actual))
        }
    }

    fn mark_existing(&mut self, index: usize) {
        if index < self.bound_len {
            self.dirty = true;
        }
    }

    pub(crate) fn get_ref(&mut self, index: usize) -> Result<&Container> {
        self.check_index(index)?;
        let value = self.slots[index].materialize(self.source.as_ref(), &self.content_type)?;
        Ok(value)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Result<&mut Container> {
        self.check_index(index)?;
        self.slots[index].materialize_mut(self.source.as_ref(), &self.content_type)
    }

    pub(crate) fn push(&mut self, item: Container) {
        self.slots.push(Slot::CacheOnly(item));
    }

    pub(crate) fn set(&mut self, index: usize, item: Container) -> Result<()> {
        self.check_index(index)?;
        self.check_item(&item)?;
        self.mark_existing(index);
        self.slots[index] = Slot::CacheOnly(item);
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<Container> {
        self.check_index(index)?;
        let slot = &mut self.slots[index];
        slot.materialize(self.source.as_ref(), &self.content_type)?;
        self.mark_existing(index);
        match self.slots.remove(index) {
            Slot::Materialized(v) | Slot::CacheOnly(v) => Ok(v),
            Slot::Unmaterialized(_) => Err(Error::Internal("removed an unread slot".into())),
        }
    }

    /// Replace all elements. Existing ones count as moved.
    pub(crate) fn replace_all(&mut self, items: Vec<Container>) {
        if self.bound_len > 0 {
            self.dirty = true;
        }
        self.slots = items.into_iter().map(Slot::CacheOnly).collect();
    }

    /// Every element, without memoizing unread ones.
    pub(crate) fn values(&self) -> Result<Vec<Container>> {
        self.slots
            .iter()
            .map(|slot| slot.peek(self.source.as_ref(), &self.content_type))
            .collect()
    }

    pub(crate) fn is_modified(&self) -> bool {
        self.source.is_none()
            || self.dirty
            || self.slots.len() != self.bound_len
            || self.slots.iter().any(Slot::is_cache_only)
    }

    /// Write every element into `target` under its index.
    ///
    /// In place, a list whose elements moved is read in full and rewritten,
    /// and backing indices past its new end are removed.
    pub(crate) fn writeback(&mut self, target: &SourceRef) -> Result<()> {
        let placement = placement(self.source.as_ref(), target);
        let rewrite = placement == Placement::InPlace && self.dirty;
        if rewrite {
            debug!(target = %target.identity(), "rewriting moved list elements");
            self.detach_elements()?;
            for index in self.slots.len()..self.bound_len {
                target.remove(&index.to_string())?;
            }
        }
        let mut tally = Tally::default();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            write_slot(
                slot,
                self.source.as_ref(),
                target,
                &index.to_string(),
                &self.content_type,
                placement,
                &mut tally,
            )?;
        }
        if placement == Placement::InPlace {
            self.bound_len = self.slots.len();
            self.dirty = false;
        }
        debug!(
            target = %target.identity(),
            ?placement,
            linked = tally.linked,
            copied = tally.copied,
            kept = tally.kept,
            "wrote back list"
        );
        Ok(())
    }

    /// Read every element in full and unbind it from the datasource.
    fn detach_elements(&mut self) -> Result<()> {
        for slot in &mut self.slots {
            slot.materialize_mut(self.source.as_ref(), &self.content_type)?
                .detach()?;
        }
        Ok(())
    }

    pub(crate) fn detach(&mut self) -> Result<()> {
        self.detach_elements()?;
        self.source = None;
        self.bound_len = 0;
        self.dirty = false;
        Ok(())
    }
}
