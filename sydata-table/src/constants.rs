/// Columns whose stored size exceeds this many bytes are compressed.
pub const COMPRESSION_THRESHOLD_BYTES: usize = 2048;

/// Value of the `ENCODING` attribute on text columns.
pub const UTF8_ENCODING: &str = "utf-8";
