use sydata_result::Result;
use sydata_types::TypeTag;

use crate::container::Container;
use crate::fixed::FixedSlots;
use crate::source::SourceRef;

/// Positional fields stored under decimal keys.
#[derive(Clone, Debug)]
pub struct Tuple {
    slots: FixedSlots,
}

fn positions(n: usize) -> Vec<String> {
    (0..n).map(|i| i.to_string()).collect()
}

impl Tuple {
    pub fn new(items: Vec<TypeTag>) -> Result<Self> {
        Ok(Self {
            slots: FixedSlots::fresh(positions(items.len()), items)?,
        })
    }

    pub fn bound(source: SourceRef, items: Vec<TypeTag>) -> Result<Self> {
        Ok(Self {
            slots: FixedSlots::bound(source, positions(items.len()), items)?,
        })
    }

    pub fn type_tag(&self) -> TypeTag {
        TypeTag::Tuple(self.slots.tags().to_vec())
    }

    pub fn datasource(&self) -> Option<&SourceRef> {
        self.slots.source()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    pub fn get(&mut self, index: usize) -> Result<Container> {
        self.slots.get_ref(index).cloned()
    }

    pub fn get_ref(&mut self, index: usize) -> Result<&Container> {
        self.slots.get_ref(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Container> {
        self.slots.get_mut(index)
    }

    pub fn set(&mut self, index: usize, item: impl Into<Container>) -> Result<()> {
        self.slots.set(index, item.into())
    }

    pub fn is_modified(&self) -> bool {
        self.slots.is_modified()
    }

    pub fn writeback(&mut self, target: &SourceRef, link: Option<&str>) -> Result<bool> {
        if link.is_some() {
            return Ok(false);
        }
        self.slots.writeback(target)?;
        Ok(true)
    }

    pub fn detach(&mut self) -> Result<()> {
        self.slots.detach()
    }
}
