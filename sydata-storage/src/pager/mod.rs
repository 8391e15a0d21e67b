//! Minimal pager trait plus in-memory and persistent implementations.
//!
//! Blobs are reference-counted byte slices so node and payload reads can be
//! shared between caches without copying.

use crate::types::PhysicalKey;
use sydata_result::Result;

pub mod instrumented_pager;
pub use instrumented_pager::*;

pub mod mem_pager;
pub use mem_pager::*;

pub mod redb_pager;
pub use redb_pager::*;

#[derive(Clone, Debug)]
pub enum BatchPut {
    Raw { key: PhysicalKey, bytes: Vec<u8> },
}

#[derive(Clone, Debug)]
pub enum BatchGet {
    Raw { key: PhysicalKey },
}

#[derive(Clone, Debug)]
pub enum GetResult<B> {
    Raw { key: PhysicalKey, bytes: B },
    Missing { key: PhysicalKey },
}

pub trait Pager: Send + Sync + 'static {
    type Blob: AsRef<[u8]> + Clone + Send + Sync + 'static;

    /// Allocate `n` new physical keys.
    fn alloc_many(&self, n: usize) -> Result<Vec<PhysicalKey>>;

    /// Batch get blobs; returns one `GetResult` per request in order.
    fn batch_get(&self, gets: &[BatchGet]) -> Result<Vec<GetResult<Self::Blob>>>;

    /// Batch put blobs at fixed keys.
    fn batch_put(&self, puts: &[BatchPut]) -> Result<()>;

    /// Batch free physical keys (best-effort). Implementations may ignore
    /// unknown keys.
    fn free_many(&self, keys: &[PhysicalKey]) -> Result<()>;
}

/// Shared blob handle used by the node store.
pub type Blob = std::sync::Arc<[u8]>;

/// Type-erased pager as held by an open file.
pub type DynPager = dyn Pager<Blob = Blob>;
