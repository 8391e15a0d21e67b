//! Per-group persistence of named columns.
//!
//! A [`TableStore`] owns one group. Each column is a child dataset named by
//! its sanitized key, carrying `ENCODING`/`ENCODING_TYPE` when its type was
//! changed for storage. All non-scalar columns share one row count. Column
//! order is persisted by [`TableStore::write_finished`].

use std::fmt;

use arrow::array::{Array, ArrayRef, Int64Array};
use arrow::datatypes::DataType;
use sydata_result::{Error, Result};
use sydata_storage::{AttrValue, Attributes, Dataset, ExternalTarget, FilterPipeline, Group, Shape};
use tracing::{debug, warn};

use crate::attrs::{AttributeMap, read_user_attrs, text_attr, write_user_attrs};
use crate::config::TableStoreConfig;
use crate::dtype::parse_dtype;
use crate::encoding::{decode_column, encode_column};
use crate::keys::{sanitize_key, unsanitize_key};
use crate::ordering::{apply_order, order_permutation};
use crate::reserved::{
    ENCODING_KEY, ENCODING_TYPE_KEY, NAME_KEY, NUMPY_TYPE_KEY, ORDER_KEY, is_reserved_key,
};
use crate::selection::{RowSelection, select_rows};

/// Extent shared by every column of a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowCount {
    /// Zero-dimensional columns holding one value each.
    Scalar,
    Rows(usize),
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCount::Scalar => f.write_str("scalar shape"),
            RowCount::Rows(n) => write!(f, "{n} rows"),
        }
    }
}

#[derive(Clone, Debug)]
struct ColumnEntry {
    key: String,
    name: String,
}

/// Columnar table over a node-store group.
#[derive(Clone, Debug)]
pub struct TableStore {
    group: Group,
    can_write: bool,
    can_link: bool,
    config: TableStoreConfig,
    columns: Vec<ColumnEntry>,
    row_count: Option<RowCount>,
}

fn row_count_of(ds: &Dataset) -> Result<RowCount> {
    if ds.is_scalar()? {
        Ok(RowCount::Scalar)
    } else {
        Ok(RowCount::Rows(ds.len()?))
    }
}

/// `ENCODING` and the effective `ENCODING_TYPE` of a stored column.
fn encoding_attrs(ds: &Dataset) -> Result<(Option<String>, Option<String>)> {
    let encoding = text_attr(ds, ENCODING_KEY)?;
    let encoding_type = match text_attr(ds, ENCODING_TYPE_KEY)? {
        Some(t) => Some(t),
        None => text_attr(ds, NUMPY_TYPE_KEY)?,
    };
    Ok((encoding, encoding_type))
}

fn decode_stored(ds: &Dataset, stored: ArrayRef) -> Result<ArrayRef> {
    let (encoding, encoding_type) = encoding_attrs(ds)?;
    decode_column(stored, encoding.as_deref(), encoding_type.as_deref())
}

/// Restore insertion order from persisted metadata, else keep `sorted`.
fn resolve_order(group: &Group, sorted: Vec<String>) -> Result<Vec<String>> {
    if group.contains(ORDER_KEY)? {
        let order = group.dataset(ORDER_KEY)?.read()?;
        let restored = order
            .as_any()
            .downcast_ref::<Int64Array>()
            .and_then(|o| apply_order(&sorted, o.values()));
        match restored {
            Some(keys) => return Ok(keys),
            None => warn!(path = group.path(), "order dataset does not match columns"),
        }
    }
    match group.attr(ORDER_KEY)? {
        Some(attr) => match attr.as_int_array().and_then(|o| apply_order(&sorted, o)) {
            Some(keys) => return Ok(keys),
            None => warn!(
                path = group.path(),
                "order attribute does not match columns, using lexicographic order"
            ),
        },
        None if sorted.len() > 1 => {
            debug!(path = group.path(), "no column order recorded");
        }
        None => {}
    }
    Ok(sorted)
}

impl TableStore {
    /// Start a table in an empty writable group.
    pub fn create(group: Group, can_link: bool) -> Result<Self> {
        if !group.file().is_writable() {
            return Err(Error::mode_violation("create", "read-only"));
        }
        if !group.is_empty()? {
            return Err(Error::InvalidArgumentError(format!(
                "table group '{}' is not empty",
                group.path()
            )));
        }
        Self::open(group, can_link)
    }

    pub fn open(group: Group, can_link: bool) -> Result<Self> {
        Self::open_with_config(group, can_link, TableStoreConfig::default())
    }

    /// Bind to `group`, reading column names, order and row count.
    ///
    /// No column data is read.
    pub fn open_with_config(
        group: Group,
        can_link: bool,
        config: TableStoreConfig,
    ) -> Result<Self> {
        let can_write = group.file().is_writable();
        let sorted: Vec<String> = group
            .keys()?
            .into_iter()
            .filter(|k| !is_reserved_key(k))
            .collect();
        let columns = resolve_order(&group, sorted)?
            .into_iter()
            .map(|key| {
                let name = unsanitize_key(&key)?;
                Ok(ColumnEntry { key, name })
            })
            .collect::<Result<Vec<_>>>()?;
        let row_count = match columns.first() {
            Some(c) => Some(row_count_of(&group.dataset(&c.key)?)?),
            None => None,
        };
        debug!(
            path = group.path(),
            columns = columns.len(),
            can_write,
            can_link,
            "opened table store"
        );
        Ok(Self {
            group,
            can_write,
            can_link,
            config,
            columns,
            row_count,
        })
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn can_write(&self) -> bool {
        self.can_write
    }

    pub fn can_link(&self) -> bool {
        self.can_link
    }

    pub fn config(&self) -> &TableStoreConfig {
        &self.config
    }

    fn ensure_writable(&self, op: &str) -> Result<()> {
        if self.can_write {
            Ok(())
        } else {
            Err(Error::mode_violation(op, "read-only"))
        }
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn row_count(&self) -> Option<RowCount> {
        self.row_count
    }

    /// Rows per column; a scalar table has one, an empty table none.
    pub fn number_of_rows(&self) -> usize {
        match self.row_count {
            Some(RowCount::Rows(n)) => n,
            Some(RowCount::Scalar) => 1,
            None => 0,
        }
    }

    fn key_of(&self, name: &str) -> Result<&str> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.key.as_str())
            .ok_or_else(|| Error::not_found(format!("column '{name}' in '{}'", self.group.path())))
    }

    /// Dataset backing `name`, with links already followed.
    pub fn column_dataset(&self, name: &str) -> Result<Dataset> {
        self.group.dataset(self.key_of(name)?)
    }

    /// On-disk key of `name`.
    pub fn column_key(&self, name: &str) -> Result<String> {
        self.key_of(name).map(str::to_string)
    }

    fn check_row_count(&self, name: &str, count: RowCount) -> Result<()> {
        let has_others = self.columns.iter().any(|c| c.name != name);
        match self.row_count {
            Some(expected) if has_others && expected != count => {
                Err(Error::ConsistencyError(format!(
                    "column '{name}' has {count}, table has {expected}"
                )))
            }
            _ => Ok(()),
        }
    }

    fn record_column(&mut self, key: String, name: &str, count: RowCount) {
        if !self.contains(name) {
            self.columns.push(ColumnEntry {
                key,
                name: name.to_string(),
            });
        }
        self.row_count = Some(count);
    }

    fn unlink_existing(&self, key: &str) -> Result<()> {
        if self.group.contains(key)? {
            self.group.remove(key)?;
        }
        Ok(())
    }

    /// Store `array` as column `name`, replacing any previous column.
    pub fn write_column(&mut self, name: &str, array: &dyn Array) -> Result<()> {
        self.write(name, array, Shape::Vector)
    }

    /// Store a one-value zero-dimensional column.
    pub fn write_scalar_column(&mut self, name: &str, value: &dyn Array) -> Result<()> {
        if value.len() != 1 {
            return Err(Error::InvalidArgumentError(format!(
                "scalar column '{name}' needs one value, got {}",
                value.len()
            )));
        }
        self.write(name, value, Shape::Scalar)
    }

    fn write(&mut self, name: &str, array: &dyn Array, shape: Shape) -> Result<()> {
        self.ensure_writable("write_column")?;
        let key = sanitize_key(name)?;
        let count = match shape {
            Shape::Scalar => RowCount::Scalar,
            Shape::Vector => RowCount::Rows(array.len()),
        };
        self.check_row_count(name, count)?;

        let encoded = encode_column(array)?;
        let bytes = encoded.array.to_data().get_slice_memory_size()?;
        let filters = self.config.pipeline_for(bytes, self.can_link);
        debug!(
            column = name,
            bytes,
            compressed = filters.is_compressed(),
            "writing column"
        );

        self.unlink_existing(&key)?;
        let ds = self
            .group
            .create_dataset(&key, encoded.array.as_ref(), shape, filters)?;
        if let Some(encoding) = encoded.encoding {
            ds.set_attr(ENCODING_KEY, encoding.into())?;
        }
        if let Some(encoding_type) = encoded.encoding_type.as_deref() {
            ds.set_attr(ENCODING_TYPE_KEY, encoding_type.into())?;
        }
        self.record_column(key, name, count);
        Ok(())
    }

    pub fn read_column(&self, name: &str) -> Result<ArrayRef> {
        let ds = self.column_dataset(name)?;
        decode_stored(&ds, ds.read()?)
    }

    /// Read a subset of rows of `name`.
    pub fn read_column_rows(&self, name: &str, selection: &RowSelection) -> Result<ArrayRef> {
        let ds = self.column_dataset(name)?;
        let rows = select_rows(&ds.read()?, selection)?;
        decode_stored(&ds, rows)
    }

    /// Type `read_column` will return for `name`.
    pub fn column_data_type(&self, name: &str) -> Result<DataType> {
        let ds = self.column_dataset(name)?;
        match encoding_attrs(&ds)? {
            (_, Some(encoding_type)) => parse_dtype(&encoding_type),
            (Some(_), None) => match ds.data_type()? {
                DataType::LargeBinary => Ok(DataType::LargeUtf8),
                _ => Ok(DataType::Utf8),
            },
            (None, None) => ds.data_type(),
        }
    }

    pub fn column_attrs(&self, name: &str) -> Result<AttributeMap> {
        read_user_attrs(&self.column_dataset(name)?)
    }

    pub fn set_column_attrs(&self, name: &str, attrs: &AttributeMap) -> Result<()> {
        self.ensure_writable("set_column_attrs")?;
        write_user_attrs(&self.column_dataset(name)?, attrs)
    }

    /// Table-level user attributes.
    pub fn attrs(&self) -> Result<AttributeMap> {
        read_user_attrs(&self.group)
    }

    pub fn set_attrs(&self, attrs: &AttributeMap) -> Result<()> {
        self.ensure_writable("set_attrs")?;
        write_user_attrs(&self.group, attrs)
    }

    pub fn name(&self) -> Result<Option<String>> {
        text_attr(&self.group, NAME_KEY)
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.ensure_writable("set_name")?;
        self.group.set_attr(NAME_KEY, name.into())
    }

    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        self.ensure_writable("remove_column")?;
        let key = self.key_of(name)?.to_string();
        self.group.remove(&key)?;
        self.columns.retain(|c| c.name != name);
        if self.columns.is_empty() {
            self.row_count = None;
        }
        Ok(())
    }

    /// Put the columns in the order of `names`, which must list each
    /// column exactly once. Persisted by the next `write_finished`.
    pub fn reorder(&mut self, names: &[String]) -> Result<()> {
        let mut positions = Vec::with_capacity(names.len());
        for name in names {
            let pos = self
                .columns
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| {
                    Error::not_found(format!("column '{name}' in '{}'", self.group.path()))
                })?;
            positions.push(pos);
        }
        let mut seen = positions.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != self.columns.len() || positions.len() != self.columns.len() {
            return Err(Error::InvalidArgumentError(format!(
                "{names:?} is not an ordering of the columns of '{}'",
                self.group.path()
            )));
        }
        self.columns = positions.into_iter().map(|p| self.columns[p].clone()).collect();
        Ok(())
    }

    /// Make column `name` refer to `other_name` of `other` without copying.
    ///
    /// Links already present on the source are followed, so the new column
    /// names the physical data. Within one file this is a hard link,
    /// otherwise an external link.
    pub fn transfer(&mut self, name: &str, other: &TableStore, other_name: &str) -> Result<()> {
        self.ensure_writable("transfer")?;
        if !(self.can_link && other.can_link) {
            return Err(Error::mode_violation("transfer", "non-linking"));
        }
        let source = other.column_dataset(other_name)?;
        let count = row_count_of(&source)?;
        self.check_row_count(name, count)?;

        let key = sanitize_key(name)?;
        if self.contains(name) && self.column_dataset(name)?.same_object(&source) {
            return Ok(());
        }
        self.unlink_existing(&key)?;
        if source.file().same_file(self.group.file()) {
            self.group.link_hard(&key, &source)?;
        } else {
            self.group
                .link_external(&key, &ExternalTarget::to_dataset(&source)?)?;
        }
        debug!(
            column = name,
            source_file = source.file().location(),
            source_path = source.path(),
            "linked column"
        );
        self.record_column(key, name, count);
        Ok(())
    }

    /// Persist column order. A no-op on read-only tables.
    pub fn write_finished(&self) -> Result<()> {
        if !self.can_write {
            return Ok(());
        }
        let keys: Vec<String> = self.columns.iter().map(|c| c.key.clone()).collect();
        let order = order_permutation(&keys);

        self.unlink_existing(ORDER_KEY)?;
        self.group.create_dataset(
            ORDER_KEY,
            &Int64Array::from(order.clone()),
            Shape::Vector,
            FilterPipeline::NONE,
        )?;
        if let Err(err) = self.group.set_attr(ORDER_KEY, AttrValue::IntArray(order)) {
            debug!(path = self.group.path(), error = %err, "order attribute not written");
            self.group.remove_attr(ORDER_KEY)?;
        }
        Ok(())
    }
}
