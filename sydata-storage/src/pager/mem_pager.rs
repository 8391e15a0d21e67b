use super::*;
use crate::constants::ROOT_NODE_PKEY;
use crate::types::PhysicalKey;
use rustc_hash::FxHashMap;
use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};
use sydata_result::Error;

/// In-memory pager backing `mem://` files, tests and benchmarks.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug)]
pub struct MemPager {
    next_key: AtomicU64,
    blobs: RwLock<FxHashMap<PhysicalKey, Blob>>,
}

impl Default for MemPager {
    fn default() -> Self {
        Self::new()
    }
}

impl MemPager {
    pub fn new() -> Self {
        Self {
            next_key: AtomicU64::new(ROOT_NODE_PKEY + 1),
            blobs: RwLock::new(FxHashMap::default()),
        }
    }

    /// Total bytes currently held, for tests that assert on duplication.
    pub fn stored_bytes(&self) -> usize {
        let map = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        map.values().map(|b| b.len()).sum()
    }
}

impl Pager for MemPager {
    type Blob = Blob;

    fn alloc_many(&self, n: usize) -> Result<Vec<PhysicalKey>> {
        let n_u64 = n as u64;
        let start = self
            .next_key
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                cur.checked_add(n_u64)
            })
            .map_err(|_| Error::Internal("physical key space overflow".to_string()))?;
        Ok((start..start + n_u64).collect())
    }

    fn batch_put(&self, puts: &[BatchPut]) -> Result<()> {
        let mut map = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        for p in puts {
            match p {
                BatchPut::Raw { key, bytes } => {
                    map.insert(*key, Arc::from(bytes.as_slice()));
                }
            }
        }
        Ok(())
    }

    fn batch_get(&self, gets: &[BatchGet]) -> Result<Vec<GetResult<Self::Blob>>> {
        let map = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = Vec::with_capacity(gets.len());
        for g in gets {
            match *g {
                BatchGet::Raw { key } => {
                    if let Some(b) = map.get(&key) {
                        out.push(GetResult::Raw {
                            key,
                            bytes: Arc::clone(b),
                        });
                    } else {
                        out.push(GetResult::Missing { key });
                    }
                }
            }
        }
        Ok(out)
    }

    fn free_many(&self, keys: &[PhysicalKey]) -> Result<()> {
        let mut map = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        for &k in keys {
            map.remove(&k);
        }
        Ok(())
    }
}
