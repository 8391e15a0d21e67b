//! sydata: lazy, type-tagged containers over a columnar node store.
//!
//! This crate is the entry point of the workspace. It re-exports the
//! container layer, the table store and the storage primitives from the
//! underlying `sydata-*` crates.
//!
//! # Quick Start
//!
//! Build a list of text values, write it into an in-memory file and read it
//! back lazily:
//!
//! ```rust
//! use sydata::{List, Text, TypeTag, with_url};
//!
//! let tag = TypeTag::list(TypeTag::Text);
//! let keep = sydata::storage::StoreFile::in_memory("quick-start").unwrap();
//! with_url("mem://quick-start?mode=w", Some(&tag), false, |value| {
//!     value.as_list_mut().unwrap().append(Text::from("hello"))
//! })
//! .unwrap();
//!
//! let len = with_url("mem://quick-start", None, true, |value| {
//!     Ok(value.as_list().map(List::len).unwrap_or(0))
//! })
//! .unwrap();
//! assert_eq!(len, 1);
//! keep.close().unwrap();
//! ```
//!
//! # Architecture
//!
//! - **Containers** (`sydata-container`): lists in three access modes, keyed
//!   containers, tables and text, built from a [`TypeTag`] by the factory.
//! - **Table store** (`sydata-table`): per-group columns with compression,
//!   type-preserving encoding, persisted order and cross-file linking.
//! - **Node store** (`sydata-storage`): groups, datasets, links and
//!   attributes over a pager.
//! - **Type tags** (`sydata-types`): the recursive container type descriptor.

pub use sydata_container::{
    Container, DataSource, Dict, GroupSource, List, ListMode, Record, ResourceUrl,
    ScopedContainer, SourceIdentity, SourceRef, Table, Text, Tuple, from_datasource, from_type,
    from_url, list_from_datasource, with_url,
};
pub use sydata_result::{Error, Result};
pub use sydata_table::{
    AttributeMap, AttributeValue, ColumnAccumulator, RowCount, RowSelection, TableStore,
    TableStoreConfig,
};
pub use sydata_types::TypeTag;

pub mod storage {
    //! Node store handles and pager implementations.

    pub use sydata_storage::pager::{InstrumentedPager, MemPager, Pager, RedbPager};
    pub use sydata_storage::{
        AccessMode, AttrValue, Attributes, Dataset, ExternalTarget, FilterPipeline, Group, Link,
        ObjectKind, Shape, StoreFile,
    };
}
