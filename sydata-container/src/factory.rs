//! Type-tag dispatch.
//!
//! The factory matches on the outermost variant of a tag (after alias
//! resolution) and builds the corresponding container, either empty or
//! bound to a datasource.

use sydata_result::{Error, Result};
use sydata_types::TypeTag;
use tracing::trace;

use crate::container::Container;
use crate::dict::Dict;
use crate::list::{List, ListMode};
use crate::record::Record;
use crate::source::SourceRef;
use crate::table::Table;
use crate::text::Text;
use crate::tuple::Tuple;

fn unsupported(tag: &TypeTag) -> Error {
    Error::UnsupportedType(format!("{} ({tag})", tag.kind_name()))
}

fn dict_value(tag: &TypeTag, key: &TypeTag, value: &TypeTag) -> Result<TypeTag> {
    match key.resolve() {
        TypeTag::Text => Ok(value.clone()),
        _ => Err(Error::UnsupportedType(format!(
            "{tag}: dictionary keys must be text"
        ))),
    }
}

/// Empty, unbound container of type `tag`.
///
/// Record and tuple fields are built recursively.
pub fn from_type(tag: &TypeTag) -> Result<Container> {
    let container = match tag.resolve() {
        TypeTag::List(inner) => List::new(inner.as_ref().clone()).into(),
        TypeTag::Dict { key, value } => Dict::new(dict_value(tag, key, value)?).into(),
        TypeTag::Record(fields) => Record::new(fields.clone())?.into(),
        TypeTag::Tuple(items) => Tuple::new(items.clone())?.into(),
        TypeTag::Table => Table::new().into(),
        TypeTag::Text => Text::new().into(),
        TypeTag::Function { .. } | TypeTag::Generic(_) | TypeTag::Alias { .. } => {
            return Err(unsupported(tag));
        }
    };
    Ok(container)
}

/// Container of type `tag` bound to `source`.
///
/// Sizes, keys and table metadata are read now; element data on access.
pub fn from_datasource(source: SourceRef, tag: &TypeTag) -> Result<Container> {
    trace!(source = %source.identity(), tag = %tag, "binding container");
    let container = match tag.resolve() {
        TypeTag::List(inner) => List::bound(source, inner.as_ref().clone())?.into(),
        TypeTag::Dict { key, value } => Dict::bound(source, dict_value(tag, key, value)?)?.into(),
        TypeTag::Record(fields) => Record::bound(source, fields.clone())?.into(),
        TypeTag::Tuple(items) => Tuple::bound(source, items.clone())?.into(),
        TypeTag::Table => Table::bound(source)?.into(),
        TypeTag::Text => Text::bound(source).into(),
        TypeTag::Function { .. } | TypeTag::Generic(_) | TypeTag::Alias { .. } => {
            return Err(unsupported(tag));
        }
    };
    Ok(container)
}

/// List of `content_type` over `source` in an explicit access mode.
pub fn list_from_datasource(
    source: SourceRef,
    content_type: TypeTag,
    mode: ListMode,
) -> Result<List> {
    match mode {
        ListMode::Normal => List::bound(source, content_type),
        ListMode::ReadThrough => List::read_through(source, content_type),
        ListMode::WriteThrough => List::write_through(source, content_type),
    }
}
