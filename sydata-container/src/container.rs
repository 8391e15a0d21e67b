use sydata_result::Result;
use sydata_types::TypeTag;

use crate::dict::Dict;
use crate::list::List;
use crate::record::Record;
use crate::source::SourceRef;
use crate::table::Table;
use crate::text::Text;
use crate::tuple::Tuple;

/// Any container the factory can build.
#[derive(Clone, Debug)]
pub enum Container {
    List(List),
    Dict(Dict),
    Record(Record),
    Tuple(Tuple),
    Table(Table),
    Text(Text),
}

/// An empty unbound text leaf.
impl Default for Container {
    fn default() -> Self {
        Container::Text(Text::default())
    }
}

macro_rules! variant_access {
    ($variant:ident, $ty:ty, $as_ref:ident, $as_mut:ident) => {
        impl From<$ty> for Container {
            fn from(value: $ty) -> Self {
                Container::$variant(value)
            }
        }

        impl Container {
            pub fn $as_ref(&self) -> Option<&$ty> {
                match self {
                    Container::$variant(v) => Some(v),
                    _ => None,
                }
            }

            pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                match self {
                    Container::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

variant_access!(List, List, as_list, as_list_mut);
variant_access!(Dict, Dict, as_dict, as_dict_mut);
variant_access!(Record, Record, as_record, as_record_mut);
variant_access!(Tuple, Tuple, as_tuple, as_tuple_mut);
variant_access!(Table, Table, as_table, as_table_mut);
variant_access!(Text, Text, as_text, as_text_mut);

impl Container {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Container::List(v) => v.type_tag(),
            Container::Dict(v) => v.type_tag(),
            Container::Record(v) => v.type_tag(),
            Container::Tuple(v) => v.type_tag(),
            Container::Table(_) => TypeTag::Table,
            Container::Text(_) => TypeTag::Text,
        }
    }

    /// Datasource this container was bound to, if any.
    pub fn datasource(&self) -> Option<&SourceRef> {
        match self {
            Container::List(v) => v.datasource(),
            Container::Dict(v) => v.datasource(),
            Container::Record(v) => v.datasource(),
            Container::Tuple(v) => v.datasource(),
            Container::Table(v) => v.datasource(),
            Container::Text(v) => v.datasource(),
        }
    }

    /// Whether the container differs from its datasource. Unbound
    /// containers always do.
    pub fn is_modified(&self) -> bool {
        match self {
            Container::List(v) => v.is_modified(),
            Container::Dict(v) => v.is_modified(),
            Container::Record(v) => v.is_modified(),
            Container::Tuple(v) => v.is_modified(),
            Container::Table(v) => v.is_modified(),
            Container::Text(v) => v.is_modified(),
        }
    }

    /// Write this container into `target`.
    ///
    /// With `link = Some(key)` only a link under `key` is attempted, and the
    /// return value tells whether it was made. Without, the full contents are
    /// written into `target` itself.
    pub fn writeback(&mut self, target: &SourceRef, link: Option<&str>) -> Result<bool> {
        match self {
            Container::List(v) => v.writeback(target, link),
            Container::Dict(v) => v.writeback(target, link),
            Container::Record(v) => v.writeback(target, link),
            Container::Tuple(v) => v.writeback(target, link),
            Container::Table(v) => v.writeback(target, link),
            Container::Text(v) => v.writeback(target, link),
        }
    }

    /// Read everything into memory and drop the datasource binding.
    pub fn detach(&mut self) -> Result<()> {
        match self {
            Container::List(v) => v.detach(),
            Container::Dict(v) => v.detach(),
            Container::Record(v) => v.detach(),
            Container::Tuple(v) => v.detach(),
            Container::Table(v) => v.detach(),
            Container::Text(v) => v.detach(),
        }
    }
}
