use std::collections::{BTreeMap, BTreeSet};

use sydata_result::{Error, Result};
use sydata_types::TypeTag;
use tracing::debug;

use crate::container::Container;
use crate::slot::Slot;
use crate::source::SourceRef;
use crate::writeback::{Placement, Tally, placement, write_slot};

/// Text-keyed mapping with lazily read values.
#[derive(Clone, Debug)]
pub struct Dict {
    value_type: TypeTag,
    source: Option<SourceRef>,
    slots: BTreeMap<String, Slot<String>>,
    /// Keys present in the datasource when bound.
    bound_keys: BTreeSet<String>,
    /// Bound keys removed since.
    removed: BTreeSet<String>,
}

impl Dict {
    pub fn new(value_type: TypeTag) -> Self {
        Self {
            value_type,
            source: None,
            slots: BTreeMap::new(),
            bound_keys: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    /// Bind to `source`. Only its keys are read.
    pub fn bound(source: SourceRef, value_type: TypeTag) -> Result<Self> {
        let keys = source.keys()?;
        Ok(Self {
            value_type,
            slots: keys
                .iter()
                .map(|k| (k.clone(), Slot::Unmaterialized(k.clone())))
                .collect(),
            bound_keys: keys.into_iter().collect(),
            source: Some(source),
            removed: BTreeSet::new(),
        })
    }

    pub fn value_type(&self) -> &TypeTag {
        &self.value_type
    }

    pub fn type_tag(&self) -> TypeTag {
        TypeTag::dict(self.value_type.clone())
    }

    pub fn datasource(&self) -> Option<&SourceRef> {
        self.source.as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    fn slot_mut(&mut self, key: &str) -> Result<&mut Slot<String>> {
        self.slots
            .get_mut(key)
            .ok_or_else(|| Error::not_found(format!("key '{key}'")))
    }

    pub fn get(&mut self, key: &str) -> Result<Container> {
        self.get_ref(key).cloned()
    }

    pub fn get_ref(&mut self, key: &str) -> Result<&Container> {
        let source = self.source.clone();
        let tag = self.value_type.clone();
        let value = self.slot_mut(key)?.materialize(source.as_ref(), &tag)?;
        Ok(value)
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Container> {
        let source = self.source.clone();
        let tag = self.value_type.clone();
        self.slot_mut(key)?.materialize_mut(source.as_ref(), &tag)
    }

    pub fn set(&mut self, key: &str, item: impl Into<Container>) -> Result<()> {
        let item = item.into();
        let actual = item.type_tag();
        if !self.value_type.accepts(&actual) {
            return Err(Error::content_type_mismatch(&self.value_type, actual));
        }
        self.slots.insert(key.to_string(), Slot::CacheOnly(item));
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.slots
            .remove(key)
            .ok_or_else(|| Error::not_found(format!("key '{key}'")))?;
        if self.bound_keys.contains(key) {
            self.removed.insert(key.to_string());
        }
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.source.is_none()
            || !self.removed.is_empty()
            || self.slots.values().any(Slot::is_cache_only)
    }

    /// Write every entry into `target`. Link requests always fail.
    pub fn writeback(&mut self, target: &SourceRef, link: Option<&str>) -> Result<bool> {
        if link.is_some() {
            return Ok(false);
        }
        let placement = placement(self.source.as_ref(), target);
        if placement == Placement::InPlace && !self.removed.is_empty() {
            // Values moved between keys may still read from a removed key.
            for slot in self.slots.values_mut() {
                if let Slot::CacheOnly(value) = slot {
                    if value
                        .datasource()
                        .is_some_and(|s| s.shares_origin(target.as_ref()))
                    {
                        value.detach()?;
                    }
                }
            }
            for key in &self.removed {
                target.remove(key)?;
            }
        }
        let mut tally = Tally::default();
        for (key, slot) in &mut self.slots {
            write_slot(
                slot,
                self.source.as_ref(),
                target,
                key,
                &self.value_type,
                placement,
                &mut tally,
            )?;
        }
        if placement == Placement::InPlace {
            self.removed.clear();
        }
        debug!(
            target = %target.identity(),
            linked = tally.linked,
            copied = tally.copied,
            kept = tally.kept,
            "wrote back dict"
        );
        Ok(true)
    }

    pub fn detach(&mut self) -> Result<()> {
        for slot in self.slots.values_mut() {
            slot.materialize_mut(self.source.as_ref(), &self.value_type)?
                .detach()?;
        }
        self.source = None;
        self.bound_keys.clear();
        self.removed.clear();
        Ok(())
    }
}
