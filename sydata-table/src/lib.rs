//! Columnar table store.
//!
//! Columns are datasets in one group of a [`sydata_storage`] file. Text and
//! temporal columns are encoded for storage and restored on read, large
//! columns are compressed, insertion order survives reopening, and columns
//! can be linked from other tables without copying.

pub mod attrs;
pub mod config;
pub mod constants;
pub mod dtype;
pub mod encoding;
pub mod keys;
pub mod ordering;
pub mod reserved;
pub mod selection;
pub mod store;
pub mod summary;

pub use attrs::{AttributeMap, AttributeValue};
pub use config::TableStoreConfig;
pub use selection::RowSelection;
pub use store::{RowCount, TableStore};
pub use summary::ColumnAccumulator;
