//! [`DataSource`] over a node-store group.
//!
//! Every child is a group named by its sanitized key and tagged with its
//! type. Text leaves hold one scalar dataset; table leaves are table stores.

use std::sync::Arc;

use arrow::array::{Array, AsArray, StringArray};
use sydata_result::{Error, Result};
use sydata_storage::{AttrValue, Attributes, ExternalTarget, Group, Shape, StoreFile};
use sydata_table::keys::{sanitize_key, unsanitize_key};
use sydata_table::reserved::{TYPE_KEY, is_reserved_key};
use sydata_table::{TableStore, TableStoreConfig};
use sydata_types::TypeTag;
use tracing::trace;

use crate::source::{DataSource, SourceIdentity, SourceRef};

/// Dataset holding the value of a text leaf.
const TEXT_KEY: &str = "text";

#[derive(Debug)]
pub struct GroupSource {
    group: Group,
    writable: bool,
    can_link: bool,
    owns_file: bool,
}

impl GroupSource {
    /// Source over `group`, writable when its file is.
    pub fn new(group: Group, can_link: bool) -> Self {
        let writable = group.file().is_writable();
        Self {
            group,
            writable,
            can_link,
            owns_file: false,
        }
    }

    /// Source over the root of `file`. `owns_file` makes `close` close it.
    pub fn root(file: &StoreFile, writable: bool, can_link: bool, owns_file: bool) -> Result<Self> {
        Ok(Self {
            group: file.root()?,
            writable: writable && file.is_writable(),
            can_link,
            owns_file,
        })
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    fn child(&self, group: Group) -> SourceRef {
        let writable = self.writable && group.file().is_writable();
        Arc::new(GroupSource {
            group,
            writable,
            can_link: self.can_link,
            owns_file: false,
        })
    }

    fn ensure_writable(&self, op: &str) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::mode_violation(op, "read-only"))
        }
    }

    fn clear_key(&self, key: &str) -> Result<()> {
        if self.group.contains(key)? {
            self.group.remove(key)?;
        }
        Ok(())
    }

    fn stored_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .group
            .keys()?
            .into_iter()
            .filter(|k| !is_reserved_key(k))
            .collect())
    }
}

impl DataSource for GroupSource {
    fn size(&self) -> Result<usize> {
        Ok(self.stored_keys()?.len())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = self
            .stored_keys()?
            .iter()
            .map(|k| unsanitize_key(k))
            .collect::<Result<Vec<_>>>()?;
        keys.sort();
        Ok(keys)
    }

    fn read_with_type(&self, key: &str, tag: &TypeTag) -> Result<SourceRef> {
        let child = self.group.group(&sanitize_key(key)?)?;
        if let Some(AttrValue::Bytes(bytes)) = child.attr(TYPE_KEY)? {
            let stored: TypeTag = String::from_utf8_lossy(&bytes).parse()?;
            if !tag.accepts(&stored) {
                return Err(Error::content_type_mismatch(tag, &stored));
            }
        }
        trace!(key, path = child.path(), "opened child source");
        Ok(self.child(child))
    }

    fn write_with_type(&self, key: &str, tag: &TypeTag) -> Result<SourceRef> {
        self.ensure_writable("write_with_type")?;
        let key = sanitize_key(key)?;
        self.clear_key(&key)?;
        let child = self.group.create_group(&key)?;
        child.set_attr(TYPE_KEY, tag.expand().to_string().as_str().into())?;
        Ok(self.child(child))
    }

    fn link(&self, key: &str, source: &dyn DataSource) -> Result<bool> {
        if !(self.writable && self.can_link && source.can_link()) {
            return Ok(false);
        }
        let identity = source.identity();
        if self.child_identity(key) == identity {
            return Ok(true);
        }
        // File roots cannot be link targets.
        let Ok(target) = ExternalTarget::new(&identity.location, &identity.path) else {
            return Ok(false);
        };
        let key = sanitize_key(key)?;
        self.clear_key(&key)?;
        self.group.link_external(&key, &target)?;
        trace!(key, target = %identity, "linked child");
        Ok(true)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.ensure_writable("remove")?;
        self.group.remove(&sanitize_key(key)?)
    }

    fn read_text(&self) -> Result<String> {
        let stored = self.group.dataset(TEXT_KEY)?.read()?;
        match stored.as_string_opt::<i32>() {
            Some(text) if text.len() == 1 => Ok(text.value(0).to_string()),
            _ => Err(Error::ConsistencyError(format!(
                "'{}' does not hold a text value",
                self.group.path()
            ))),
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.ensure_writable("write_text")?;
        self.clear_key(TEXT_KEY)?;
        let filters = TableStoreConfig::default().pipeline_for(text.len(), self.can_link);
        self.group.create_dataset(
            TEXT_KEY,
            &StringArray::from(vec![text]),
            Shape::Scalar,
            filters,
        )?;
        Ok(())
    }

    fn table_store(&self) -> Result<TableStore> {
        TableStore::open(self.group.clone(), self.can_link)
    }

    fn can_write(&self) -> bool {
        self.writable
    }

    fn can_link(&self) -> bool {
        self.can_link
    }

    fn identity(&self) -> SourceIdentity {
        SourceIdentity {
            location: self.group.file().location().to_string(),
            path: self.group.path().to_string(),
        }
    }

    fn child_identity(&self, key: &str) -> SourceIdentity {
        let key = sanitize_key(key).unwrap_or_else(|_| key.to_string());
        let base = self.group.path().trim_end_matches('/');
        SourceIdentity {
            location: self.group.file().location().to_string(),
            path: format!("{base}/{key}"),
        }
    }

    fn close(&self) -> Result<()> {
        if self.owns_file {
            self.group.file().close()?;
        }
        Ok(())
    }
}
