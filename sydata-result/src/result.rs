use crate::error::Error;

/// Result type alias used throughout sydata.
///
/// Shorthand for `std::result::Result<T, Error>`; every fallible sydata
/// operation returns it.
pub type Result<T> = std::result::Result<T, Error>;
