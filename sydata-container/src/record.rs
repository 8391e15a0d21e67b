use sydata_result::{Error, Result};
use sydata_types::TypeTag;

use crate::container::Container;
use crate::fixed::FixedSlots;
use crate::source::SourceRef;

/// Named fields, typed by the record's tag.
#[derive(Clone, Debug)]
pub struct Record {
    slots: FixedSlots,
}

fn split(fields: Vec<(String, TypeTag)>) -> (Vec<String>, Vec<TypeTag>) {
    fields.into_iter().unzip()
}

impl Record {
    /// Record whose fields hold empty values of their types.
    pub fn new(fields: Vec<(String, TypeTag)>) -> Result<Self> {
        let (names, tags) = split(fields);
        Ok(Self {
            slots: FixedSlots::fresh(names, tags)?,
        })
    }

    pub fn bound(source: SourceRef, fields: Vec<(String, TypeTag)>) -> Result<Self> {
        let (names, tags) = split(fields);
        Ok(Self {
            slots: FixedSlots::bound(source, names, tags)?,
        })
    }

    pub fn type_tag(&self) -> TypeTag {
        TypeTag::Record(
            self.slots
                .keys()
                .iter()
                .cloned()
                .zip(self.slots.tags().iter().cloned())
                .collect(),
        )
    }

    pub fn datasource(&self) -> Option<&SourceRef> {
        self.slots.source()
    }

    pub fn field_names(&self) -> &[String] {
        self.slots.keys()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() == 0
    }

    fn position(&self, field: &str) -> Result<usize> {
        self.slots
            .keys()
            .iter()
            .position(|k| k == field)
            .ok_or_else(|| Error::not_found(format!("field '{field}'")))
    }

    pub fn get(&mut self, field: &str) -> Result<Container> {
        self.get_ref(field).cloned()
    }

    pub fn get_ref(&mut self, field: &str) -> Result<&Container> {
        let index = self.position(field)?;
        self.slots.get_ref(index)
    }

    pub fn get_mut(&mut self, field: &str) -> Result<&mut Container> {
        let index = self.position(field)?;
        self.slots.get_mut(index)
    }

    pub fn set(&mut self, field: &str, item: impl Into<Container>) -> Result<()> {
        let index = self.position(field)?;
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
