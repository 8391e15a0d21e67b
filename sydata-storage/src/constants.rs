use crate::types::PhysicalKey;

/// Well-known key for the root group node of every file.
pub const ROOT_NODE_PKEY: PhysicalKey = 0;

/// Largest encoded attribute value accepted on a node (64 KiB compact
/// attribute limit).
pub const MAX_ATTRIBUTE_BYTES: usize = 64 * 1024;

/// Location prefix for in-memory files.
pub const MEM_LOCATION_PREFIX: &str = "mem://";
