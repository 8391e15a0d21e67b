use sydata_storage::FilterPipeline;

use crate::constants::COMPRESSION_THRESHOLD_BYTES;

/// Run-time configuration for a [`TableStore`](crate::TableStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStoreConfig {
    /// Columns up to this many bytes are stored uncompressed.
    pub compression_threshold: usize,
    /// Pipeline for link-capable tables.
    pub internal: FilterPipeline,
    /// Pipeline for tables that will be read by other tools.
    pub shareable: FilterPipeline,
}

impl Default for TableStoreConfig {
    fn default() -> Self {
        Self {
            compression_threshold: COMPRESSION_THRESHOLD_BYTES,
            internal: FilterPipeline::internal(),
            shareable: FilterPipeline::shareable(),
        }
    }
}

impl TableStoreConfig {
    /// Pipeline for a column of `bytes` stored size.
    pub fn pipeline_for(&self, bytes: usize, can_link: bool) -> FilterPipeline {
        if bytes <= self.compression_threshold {
            FilterPipeline::NONE
        } else if can_link {
            self.internal
        } else {
            self.shareable
        }
    }
}
