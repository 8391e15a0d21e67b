//! Generic ordered container.
//!
//! A [`List`] is one of three implementations, fixed at construction:
//!
//! - [`NormalList`]: mutable, caches every element it reads or receives.
//! - [`ReadThroughList`]: reads lazily from a datasource, rejects mutation.
//! - [`WriteThroughList`]: over an empty datasource, writes each appended
//!   element immediately and reads indices back fresh.

mod cache;
mod normal;
mod read_through;
mod write_through;

use std::fmt;
use std::ops::Range;

use sydata_result::{Error, Result};
use sydata_types::TypeTag;

pub use normal::NormalList;
pub use read_through::ReadThroughList;
pub use write_through::WriteThroughList;

use crate::container::Container;
use crate::source::SourceRef;
use normal::slice_cache;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMode {
    Normal,
    ReadThrough,
    WriteThrough,
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListMode::Normal => "normal",
            ListMode::ReadThrough => "read-through",
            ListMode::WriteThrough => "write-through",
        })
    }
}

#[derive(Clone, Debug)]
pub enum List {
    Normal(NormalList),
    ReadThrough(ReadThroughList),
    WriteThrough(WriteThroughList),
}

fn read_only(op: &str) -> Error {
    Error::mode_violation(op, ListMode::ReadThrough)
}

impl List {
    /// Empty unbound list.
    pub fn new(content_type: TypeTag) -> Self {
        List::Normal(NormalList::new(content_type))
    }

    /// Mutable list over the elements of `source`.
    pub fn bound(source: SourceRef, content_type: TypeTag) -> Result<Self> {
        Ok(List::Normal(NormalList::bound(source, content_type)?))
    }

    pub fn read_through(source: SourceRef, content_type: TypeTag) -> Result<Self> {
        Ok(List::ReadThrough(ReadThroughList::new(source, content_type)?))
    }

    /// Fails with `ModeViolation` unless `source` is writable and empty.
    pub fn write_through(source: SourceRef, content_type: TypeTag) -> Result<Self> {
        Ok(List::WriteThrough(WriteThroughList::new(source, content_type)?))
    }

    pub fn mode(&self) -> ListMode {
        match self {
            List::Normal(_) => ListMode::Normal,
            List::ReadThrough(_) => ListMode::ReadThrough,
            List::WriteThrough(_) => ListMode::WriteThrough,
        }
    }

    pub fn content_type(&self) -> &TypeTag {
        match self {
            List::Normal(l) => l.cache().content_type(),
            List::ReadThrough(l) => l.cache().content_type(),
            List::WriteThrough(l) => l.content_type(),
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        TypeTag::list(self.content_type().clone())
    }

    pub fn datasource(&self) -> Option<&SourceRef> {
        match self {
            List::Normal(l) => l.cache().source(),
            List::ReadThrough(l) => l.cache().source(),
            List::WriteThrough(l) => Some(l.source()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            List::Normal(l) => l.cache().len(),
            List::ReadThrough(l) => l.cache().len(),
            List::WriteThrough(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn append(&mut self, item: impl Into<Container>) -> Result<()> {
        match self {
            List::Normal(l) => l.append(item.into()),
            List::ReadThrough(_) => Err(read_only("append")),
            List::WriteThrough(l) => l.append(item.into()),
        }
    }

    /// Append every element of `other`, whose content type must match.
    pub fn extend(&mut self, other: &List) -> Result<()> {
        if !self.content_type().accepts(other.content_type()) {
            return Err(Error::content_type_mismatch(self.type_tag(), other.type_tag()));
        }
        match self {
            List::Normal(l) => {
                l.extend(other.values()?);
                Ok(())
            }
            List::ReadThrough(_) => Err(read_only("extend")),
            List::WriteThrough(l) => {
                for item in other.values()? {
                    l.append(item)?;
                }
                Ok(())
            }
        }
    }

    /// Element `index`. Cached lists read each backing index once.
    pub fn get(&mut self, index: usize) -> Result<Container> {
        match self {
            List::WriteThrough(l) => l.get(index),
            _ => self.get_ref(index).cloned(),
        }
    }

    /// Borrow the cached element `index`.
    pub fn get_ref(&mut self, index: usize) -> Result<&Container> {
        match self {
            List::Normal(l) => l.cache_mut().get_ref(index),
            List::ReadThrough(l) => l.cache_mut().get_ref(index),
            List::WriteThrough(_) => Err(WriteThroughList::forbidden("get_ref")),
        }
    }

    /// Borrow element `index` for modification.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Container> {
        match self {
            List::Normal(l) => l.cache_mut().get_mut(index),
            List::ReadThrough(_) => Err(read_only("get_mut")),
            List::WriteThrough(_) => Err(WriteThroughList::forbidden("get_mut")),
        }
    }

    pub fn set(&mut self, index: usize, item: impl Into<Container>) -> Result<()> {
        match self {
            List::Normal(l) => l.set(index, item.into()),
            List::ReadThrough(_) => Err(read_only("set")),
            List::WriteThrough(_) => Err(WriteThroughList::forbidden("set")),
        }
    }

    pub fn remove(&mut self, index: usize) -> Result<Container> {
        match self {
            List::Normal(l) => l.remove(index),
            List::ReadThrough(_) => Err(read_only("remove")),
            List::WriteThrough(_) => Err(WriteThroughList::forbidden("remove")),
        }
    }

    /// Materialize `range` and return it as a new unbound list.
    pub fn slice(&mut self, range: Range<usize>) -> Result<List> {
        match self {
            List::Normal(l) => slice_cache(l.cache_mut(), range),
            List::ReadThrough(l) => slice_cache(l.cache_mut(), range),
            List::WriteThrough(_) => Err(WriteThroughList::forbidden("slice")),
        }
    }

    /// Replace the contents with a copy of `other`'s.
    pub fn source(&mut self, other: &List) -> Result<()> {
        if !self.content_type().accepts(other.content_type()) {
            return Err(Error::content_type_mismatch(self.type_tag(), other.type_tag()));
        }
        match self {
            List::Normal(l) => {
                l.source_from(other.values()?);
                Ok(())
            }
            List::ReadThrough(_) => Err(read_only("source")),
            List::WriteThrough(_) => Err(WriteThroughList::forbidden("source")),
        }
    }

    /// Every element, reading unread ones without caching them.
    pub fn values(&self) -> Result<Vec<Container>> {
        match self {
            List::Normal(l) => l.cache().values(),
            List::ReadThrough(l) => l.cache().values(),
            List::WriteThrough(l) => l.values(),
        }
    }

    pub fn is_modified(&self) -> bool {
        match self {
            List::Normal(l) => l.cache().is_modified(),
            List::ReadThrough(_) | List::WriteThrough(_) => false,
        }
    }

    /// Write the list into `target`. Link requests always fail.
    pub fn writeback(&mut self, target: &SourceRef, link: Option<&str>) -> Result<bool> {
        if link.is_some() {
            return Ok(false);
        }
        match self {
            List::Normal(l) => l.cache_mut().writeback(target)?,
            List::ReadThrough(l) => l.cache_mut().writeback(target)?,
            List::WriteThrough(l) => l.writeback(target)?,
        }
        Ok(true)
    }

    pub fn detach(&mut self) -> Result<()> {
        match self {
            List::Normal(l) => l.cache_mut().detach(),
            List::ReadThrough(l) => l.cache_mut().detach(),
            List::WriteThrough(_) => Err(WriteThroughList::forbidden("detach")),
        }
    }
}
