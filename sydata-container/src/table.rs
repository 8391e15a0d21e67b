//! In-memory view of a table with lazily read columns.
//!
//! A bound table reads its column names, name and attributes when it is
//! created; column data is read on first access. Row subsets of columns not
//! yet read go straight to the store's indexed read path.

use std::collections::BTreeMap;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;
use sydata_result::{Error, Result};
use sydata_table::selection::select_rows;
use sydata_table::{AttributeMap, RowCount, RowSelection, TableStore};
use tracing::debug;

use crate::slot::Slot;
use crate::source::SourceRef;

type ColumnSlot = Slot<String, ArrayRef>;

#[derive(Clone, Debug, Default)]
pub struct Table {
    source: Option<SourceRef>,
    store: Option<TableStore>,
    columns: Vec<(String, ColumnSlot)>,
    row_count: Option<RowCount>,
    name: Option<String>,
    attrs: AttributeMap,
    /// Column attributes set since binding.
    column_attrs: BTreeMap<String, AttributeMap>,
    meta_modified: bool,
    /// A bound column was removed.
    columns_removed: bool,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(source: SourceRef) -> Result<Self> {
        let store = source.table_store()?;
        Ok(Self {
            columns: store
                .column_names()
                .into_iter()
                .map(|name| (name.clone(), Slot::Unmaterialized(name)))
                .collect(),
            row_count: store.row_count(),
            name: store.name()?,
            attrs: store.attrs()?,
            store: Some(store),
            source: Some(source),
            column_attrs: BTreeMap::new(),
            meta_modified: false,
            columns_removed: false,
        })
    }

    pub fn datasource(&self) -> Option<&SourceRef> {
        self.source.as_ref()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn row_count(&self) -> Option<RowCount> {
        self.row_count
    }

    pub fn number_of_rows(&self) -> usize {
        match self.row_count {
            Some(RowCount::Rows(n)) => n,
            Some(RowCount::Scalar) => 1,
            None => 0,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    fn slot(&self, name: &str) -> Result<&ColumnSlot> {
        self.position(name)
            .map(|i| &self.columns[i].1)
            .ok_or_else(|| Error::not_found(format!("column '{name}'")))
    }

    fn store(&self) -> Result<&TableStore> {
        self.store
            .as_ref()
            .ok_or_else(|| Error::Internal("unread column without a table store".into()))
    }

    /// Whether the data of `name` has been read into memory.
    pub fn is_column_loaded(&self, name: &str) -> bool {
        self.slot(name).is_ok_and(|s| !s.is_unmaterialized())
    }

    /// Column `name`, read from the store on first access.
    pub fn column(&mut self, name: &str) -> Result<ArrayRef> {
        let pos = self
            .position(name)
            .ok_or_else(|| Error::not_found(format!("column '{name}'")))?;
        if let Slot::Unmaterialized(key) = &self.columns[pos].1 {
            let array = self.store()?.read_column(key)?;
            self.columns[pos].1 = Slot::Materialized(array);
        }
        match &self.columns[pos].1 {
            Slot::Materialized(a) | Slot::CacheOnly(a) => Ok(a.clone()),
            Slot::Unmaterialized(_) => Err(Error::Internal("column left unread".into())),
        }
    }

    /// Rows of `name` picked by `selection`, without caching the column.
    pub fn column_rows(&self, name: &str, selection: &RowSelection) -> Result<ArrayRef> {
        match self.slot(name)? {
            Slot::Unmaterialized(key) => self.store()?.read_column_rows(key, selection),
            Slot::Materialized(a) | Slot::CacheOnly(a) => select_rows(a, selection),
        }
    }

    pub fn column_data_type(&self, name: &str) -> Result<DataType> {
        match self.slot(name)? {
            Slot::Unmaterialized(key) => self.store()?.column_data_type(key),
            Slot::Materialized(a) | Slot::CacheOnly(a) => Ok(a.data_type().clone()),
        }
    }

    fn check_rows(&self, name: &str, count: RowCount) -> Result<()> {
        let has_others = self.columns.iter().any(|(n, _)| n != name);
        match self.row_count {
            Some(expected) if has_others && expected != count => Err(Error::ConsistencyError(
                format!("column '{name}' has {count}, table has {expected}"),
            )),
            _ => Ok(()),
        }
    }

    fn put_column(&mut self, name: &str, array: ArrayRef, count: RowCount) -> Result<()> {
        if array.data_type().is_nested() {
            return Err(Error::ConsistencyError(format!(
                "column '{name}' is multi-dimensional ({})",
                array.data_type()
            )));
        }
        self.check_rows(name, count)?;
        self.column_attrs.remove(name);
        match self.position(name) {
            Some(pos) => self.columns[pos].1 = Slot::CacheOnly(array),
            None => self
                .columns
                .push((name.to_string(), Slot::CacheOnly(array))),
        }
        self.row_count = Some(count);
        Ok(())
    }

    /// Set column `name`, replacing any previous column and its attributes.
    pub fn set_column(&mut self, name: &str, array: ArrayRef) -> Result<()> {
        let count = RowCount::Rows(array.len());
        self.put_column(name, array, count)
    }

    pub fn set_scalar_column(&mut self, name: &str, value: ArrayRef) -> Result<()> {
        if value.len() != 1 {
            return Err(Error::InvalidArgumentError(format!(
                "scalar column '{name}' needs one value, got {}",
                value.len()
            )));
        }
        self.put_column(name, value, RowCount::Scalar)
    }

    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        let pos = self
            .position(name)
            .ok_or_else(|| Error::not_found(format!("column '{name}'")))?;
        let (_, slot) = self.columns.remove(pos);
        if !slot.is_cache_only() {
            self.columns_removed = true;
        }
        self.column_attrs.remove(name);
        if self.columns.is_empty() {
            self.row_count = None;
        }
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
        self.meta_modified = true;
    }

    pub fn attrs(&self) -> &AttributeMap {
        &self.attrs
    }

    pub fn set_attrs(&mut self, attrs: AttributeMap) {
        self.attrs = attrs;
        self.meta_modified = true;
    }

    /// User attributes of column `name`.
    pub fn column_attrs(&self, name: &str) -> Result<AttributeMap> {
        if let Some(attrs) = self.column_attrs.get(name) {
            return Ok(attrs.clone());
        }
        match self.slot(name)? {
            Slot::CacheOnly(_) => Ok(AttributeMap::new()),
            Slot::Unmaterialized(_) | Slot::Materialized(_) => self.store()?.column_attrs(name),
        }
    }

    pub fn set_column_attrs(&mut self, name: &str, attrs: AttributeMap) -> Result<()> {
        self.slot(name)?;
        self.column_attrs.insert(name.to_string(), attrs);
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.source.is_none()
            || self.meta_modified
            || self.columns_removed
            || !self.column_attrs.is_empty()
            || self.columns.iter().any(|(_, s)| s.is_cache_only())
    }

    fn in_place(&self, target: &SourceRef) -> bool {
        self.source
            .as_ref()
            .is_some_and(|s| s.identity() == target.identity())
    }

    /// Write the table into `target`.
    ///
    /// Columns still held by the store are linked when both stores permit
    /// it and copied otherwise. A link request succeeds only for an
    /// unmodified bound table.
    pub fn writeback(&mut self, target: &SourceRef, link: Option<&str>) -> Result<bool> {
        if let Some(key) = link {
            return match &self.source {
                Some(source) if !self.is_modified() => target.link(key, source.as_ref()),
                _ => Ok(false),
            };
        }
        let in_place = self.in_place(target);
        if in_place && !self.is_modified() {
            return Ok(true);
        }

        let mut out = target.table_store()?;
        for name in out.column_names() {
            let keep = in_place
                && self
                    .slot(&name)
                    .is_ok_and(|s| !s.is_cache_only());
            if !keep {
                out.remove_column(&name)?;
            }
        }

        let (mut linked, mut copied) = (0usize, 0usize);
        for (name, slot) in &self.columns {
            if in_place && !slot.is_cache_only() {
                continue;
            }
            let linkable = !slot.is_cache_only()
                && !self.column_attrs.contains_key(name)
                && out.can_link()
                && self.store.as_ref().is_some_and(TableStore::can_link);
            if linkable {
                out.transfer(name, self.store()?, name)?;
                linked += 1;
                continue;
            }
            let array = match slot {
                Slot::Unmaterialized(key) => self.store()?.read_column(key)?,
                Slot::Materialized(a) | Slot::CacheOnly(a) => a.clone(),
            };
            if self.row_count == Some(RowCount::Scalar) {
                out.write_scalar_column(name, array.as_ref())?;
            } else {
                out.write_column(name, array.as_ref())?;
            }
            if !slot.is_cache_only() && !self.column_attrs.contains_key(name) {
                out.set_column_attrs(name, &self.store()?.column_attrs(name)?)?;
            }
            copied += 1;
        }
        for (name, attrs) in &self.column_attrs {
            out.set_column_attrs(name, attrs)?;
        }

        out.reorder(&self.column_names())?;
        out.set_attrs(&self.attrs)?;
        if let Some(name) = &self.name {
            out.set_name(name)?;
        }
        out.write_finished()?;
        debug!(
            target = %target.identity(),
            linked,
            copied,
            in_place,
            "wrote back table"
        );

        if in_place {
            for (_, slot) in &mut self.columns {
                if let Slot::CacheOnly(a) = slot {
                    let array = a.clone();
                    *slot = Slot::Materialized(array);
                }
            }
            self.store = Some(out);
            self.column_attrs.clear();
            self.meta_modified = false;
            self.columns_removed = false;
        }
        Ok(true)
    }

    pub fn detach(&mut self) -> Result<()> {
        for name in self.column_names() {
            let attrs = self.column_attrs(&name)?;
            let array = self.column(&name)?;
            if let Some(pos) = self.position(&name) {
                self.columns[pos].1 = Slot::CacheOnly(array);
            }
            if !attrs.is_empty() {
                self.column_attrs.insert(name, attrs);
            }
        }
        self.store = None;
        self.source = None;
        self.columns_removed = false;
        Ok(())
    }
}
