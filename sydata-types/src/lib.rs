//! Symbolic container type tags.
//!
//! A [`TypeTag`] describes the shape of a container: lists, dictionaries,
//! records, tuples, tables, text leaves, plus the non-instantiable `Function`
//! and `Generic` forms. Tags have a compact text form used in file headers:
//!
//! | Tag                  | Text form           |
//! |----------------------|---------------------|
//! | `List(T)`            | `[T]`               |
//! | `Dict(text, T)`      | `{T}`               |
//! | `Dict(K, T)`         | `{K: T}`            |
//! | `Record`             | `(a: T, b: U)`      |
//! | `Tuple`              | `(T, U)` / `(T,)`   |
//! | `Table`              | `table`             |
//! | `Text`               | `text`              |
//! | `Function`           | `A -> B`            |
//! | `Generic`            | `<a>`               |
//! | `Alias(name -> T)`   | `name`              |

mod parse;
pub mod type_tag;

pub use parse::AliasMap;
pub use type_tag::TypeTag;
