//! Hierarchical node store for sydata.
//!
//! A file is a tree of groups and datasets stored as encoded nodes in a
//! [`pager::Pager`]. Datasets hold one Arrow array each, passed through a
//! per-dataset [`FilterPipeline`] (byte shuffle plus LZ4 or zstd). Groups map
//! names to hard links (same file) or external links (another open or
//! on-disk file). Both carry small typed attributes.
//!
//! ```
//! use arrow::array::Int64Array;
//! use sydata_storage::{FilterPipeline, Shape, StoreFile};
//!
//! let file = StoreFile::in_memory("doc-example").unwrap();
//! let root = file.root().unwrap();
//! let ds = root
//!     .create_dataset("x", &Int64Array::from(vec![1, 2, 3]), Shape::Vector, FilterPipeline::NONE)
//!     .unwrap();
//! assert_eq!(ds.len().unwrap(), 3);
//! file.close().unwrap();
//! ```

pub mod attrs;
pub mod codecs;
pub mod constants;
pub mod dataset;
pub mod external;
pub mod file;
pub mod filters;
pub mod group;
pub mod node;
pub mod pager;
pub mod serialization;
pub mod types;

pub use attrs::{AttrValue, Attributes};
pub use dataset::Dataset;
pub use external::ExternalTarget;
pub use file::{AccessMode, FileId, StoreFile};
pub use filters::{Compression, FilterPipeline};
pub use group::{Group, ObjectKind};
pub use node::{Link, Shape};
pub use types::PhysicalKey;
