use std::fmt;
use std::sync::Arc;

use sydata_result::Result;
use sydata_table::TableStore;
use sydata_types::TypeTag;

/// Where a datasource lives: a file location and an object path in it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    pub location: String,
    pub path: String,
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.location, self.path)
    }
}

pub type SourceRef = Arc<dyn DataSource>;

/// Backing store of one container.
///
/// Children are addressed by string keys: decimal indices for lists and
/// tuples, user keys for dictionaries, field names for records.
pub trait DataSource: fmt::Debug + Send + Sync {
    /// Number of children.
    fn size(&self) -> Result<usize>;

    /// Child keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    /// Datasource of the existing child `key`, expected to hold `tag`.
    fn read_with_type(&self, key: &str, tag: &TypeTag) -> Result<SourceRef>;

    /// Create (or replace) child `key` to hold a value of type `tag`.
    fn write_with_type(&self, key: &str, tag: &TypeTag) -> Result<SourceRef>;

    /// Make child `key` refer to `source` without copying.
    ///
    /// Returns `false` when either side cannot link.
    fn link(&self, key: &str, source: &dyn DataSource) -> Result<bool>;

    fn remove(&self, key: &str) -> Result<()>;

    fn read_text(&self) -> Result<String>;

    fn write_text(&self, text: &str) -> Result<()>;

    /// Table store over this source.
    fn table_store(&self) -> Result<TableStore>;

    fn can_write(&self) -> bool;

    fn can_link(&self) -> bool;

    fn identity(&self) -> SourceIdentity;

    /// Identity child `key` has or would have.
    fn child_identity(&self, key: &str) -> SourceIdentity;

    /// Whether both sources live in the same file.
    fn shares_origin(&self, other: &dyn DataSource) -> bool {
        self.identity().location == other.identity().location
    }

    /// Release the underlying file if this source owns it.
    fn close(&self) -> Result<()>;
}
