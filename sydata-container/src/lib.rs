//! Lazy, type-tagged containers over sydata datasources.
//!
//! Containers are built by the [`factory`] from a [`TypeTag`]: empty, bound
//! to a [`DataSource`], or opened from a URL inside a [`ScopedContainer`]
//! that writes back and closes on exit. Bound containers read their size
//! eagerly and their elements on first access.
//!
//! Writing a container into a target first tries to link each element
//! there and copies only what cannot be linked.
//!
//! [`TypeTag`]: sydata_types::TypeTag

pub mod container;
pub mod dict;
pub mod factory;
mod fixed;
pub mod group_source;
pub mod list;
pub mod record;
pub mod resource;
pub mod slot;
pub mod source;
pub mod table;
pub mod text;
pub mod tuple;
mod writeback;

pub use container::Container;
pub use dict::Dict;
pub use factory::{from_datasource, from_type, list_from_datasource};
pub use group_source::GroupSource;
pub use list::{List, ListMode};
pub use record::Record;
pub use slot::Slot;
pub use source::{DataSource, SourceIdentity, SourceRef};
pub use table::Table;
pub use text::Text;
pub use tuple::Tuple;
pub use resource::{FORMAT_VERSION, ResourceUrl, ScopedContainer, from_url, with_url};
