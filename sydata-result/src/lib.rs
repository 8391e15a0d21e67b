//! Error types and result definitions for the sydata workspace.
//!
//! Every sydata crate reports failures through the single [`Error`] enum and the
//! [`Result<T>`] alias defined here, so errors cross crate boundaries with `?`
//! and callers can match on the variant that matters to them.
//!
//! # Error Categories
//!
//! - **I/O and backend errors** ([`Error::Io`], [`Error::Backend`]): file access
//!   and the persistent pager.
//! - **Data format errors** ([`Error::Arrow`], [`Error::Codec`]): Arrow array
//!   construction, compression, node decoding.
//! - **Dispatch errors** ([`Error::UnsupportedType`]): a container type tag with
//!   no implementation.
//! - **Access mode errors** ([`Error::ModeViolation`]): an operation the
//!   container or file was not opened for.
//! - **Consistency errors** ([`Error::ConsistencyError`]): column shape and
//!   length invariants, content type mismatches.
//! - **Lookup failures** ([`Error::NotFound`]) and bad input
//!   ([`Error::InvalidArgumentError`]).
//! - **Internal errors** ([`Error::Internal`]): violated internal invariants.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
