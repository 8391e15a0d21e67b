//! Reserved attribute and child names.
//!
//! Every name of the form `__sy_*__` belongs to the store. Reserved names are
//! hidden from user-visible attribute views and column listings, and user
//! input is never written under one.

/// Table-level: persisted column order (dataset and attribute).
pub const ORDER_KEY: &str = "__sy_order__";

/// Table-level: table display name.
pub const NAME_KEY: &str = "__sy_name__";

/// Column-level: text encoding of a byte-string column.
pub const ENCODING_KEY: &str = "__sy_encoding__";

/// Column-level: dtype the column had before encoding.
pub const ENCODING_TYPE_KEY: &str = "__sy_encoding_type__";

/// Column-level: dtype written by older files, read as a fallback for
/// `ENCODING_TYPE_KEY`.
pub const NUMPY_TYPE_KEY: &str = "__sy_numpy_type__";

/// File-level: container type tag of the root.
pub const TYPE_KEY: &str = "__sy_type__";

/// File-level: format version.
pub const VERSION_KEY: &str = "__sy_version__";

pub const RESERVED_PREFIX: &str = "__sy_";
const RESERVED_SUFFIX: &str = "__";

/// Whether `key` matches `^__sy_.*__$`.
#[inline]
pub fn is_reserved_key(key: &str) -> bool {
    key.len() >= RESERVED_PREFIX.len() + RESERVED_SUFFIX.len()
        && key.starts_with(RESERVED_PREFIX)
        && key.ends_with(RESERVED_SUFFIX)
}
