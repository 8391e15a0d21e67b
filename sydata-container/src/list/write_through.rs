use sydata_result::{Error, Result};
use sydata_types::TypeTag;
use tracing::debug;

use super::ListMode;
use crate::container::Container;
use crate::slot::load;
use crate::source::SourceRef;
use crate::writeback::{Placement, Tally, placement, write_element};

/// Append-only list that writes every element to its datasource at once.
///
/// Nothing is cached: reading an index always goes back to the datasource.
#[derive(Clone, Debug)]
pub struct WriteThroughList {
    content_type: TypeTag,
    source: SourceRef,
    count: usize,
}

impl WriteThroughList {
    /// Bind to an empty writable datasource.
    pub(crate) fn new(source: SourceRef, content_type: TypeTag) -> Result<Self> {
        if !source.can_write() {
            return Err(Error::ModeViolation(format!(
                "write-through list needs a writable datasource, '{}' is read-only",
                source.identity()
            )));
        }
        let size = source.size()?;
        if size != 0 {
            return Err(Error::ModeViolation(format!(
                "write-through list needs an empty datasource, '{}' holds {size} elements",
                source.identity()
            )));
        }
        Ok(Self {
            content_type,
            source,
            count: 0,
        })
    }

    pub(crate) fn content_type(&self) -> &TypeTag {
        &self.content_type
    }

    pub(crate) fn source(&self) -> &SourceRef {
        &self.source
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn append(&mut self, mut item: Container) -> Result<()> {
        let actual = item.type_tag();
        if !self.content_type.accepts(&actual) {
            return Err(Error::content_type_mismatch(&self.content_type, actual));
        }
        let mut tally = Tally::default();
        write_element(
            &mut item,
            &self.source,
            &self.count.to_string(),
            &self.content_type,
            &mut tally,
        )?;
        self.count += 1;
        Ok(())
    }

    /// Read index `index` fresh from the datasource.
    pub(crate) fn get(&self, index: usize) -> Result<Container> {
        if index >= self.count {
            return Err(Error::InvalidArgumentError(format!(
                "index {index} out of range for list of length {}",
                self.count
            )));
        }
        load(Some(&self.source), &index.to_string(), &self.content_type)
    }

    pub(crate) fn values(&self) -> Result<Vec<Container>> {
        (0..self.count).map(|i| self.get(i)).collect()
    }

    pub(crate) fn writeback(&self, target: &SourceRef) -> Result<()> {
        if placement(Some(&self.source), target) == Placement::InPlace {
            return Ok(());
        }
        let mut tally = Tally::default();
        for index in 0..self.count {
            let mut value = self.get(index)?;
            write_element(
                &mut value,
                target,
                &index.to_string(),
                &self.content_type,
                &mut tally,
            )?;
        }
        debug!(
            target = %target.identity(),
            linked = tally.linked,
            copied = tally.copied,
            "wrote back write-through list"
        );
        Ok(())
    }

    pub(crate) fn forbidden(op: &str) -> Error {
        Error::mode_violation(op, ListMode::WriteThrough)
    }
}
