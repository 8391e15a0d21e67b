//! Pager backed by a single `redb` table.
//!
//! - Persistent backing file with transactional batch writes.
//! - Key allocator is seeded from the largest stored key once on open.

use super::{BatchGet, BatchPut, Blob, GetResult, Pager};
use crate::constants::ROOT_NODE_PKEY;
use crate::types::PhysicalKey;

use redb::{Database, ReadableTable, TableDefinition};
use sydata_result::{Error, Result};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const BLOBS: TableDefinition<u64, &[u8]> = TableDefinition::new("sydata_blobs");

pub struct RedbPager {
    db: Database,
    path: PathBuf,
    next_key: AtomicU64,
}

impl fmt::Debug for RedbPager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let next = self.next_key.load(Ordering::Relaxed);
        f.debug_struct("RedbPager")
            .field("path", &self.path)
            .field("next_key", &next)
            .finish()
    }
}

impl RedbPager {
    /// Open (or create) a database at `path` and seed the allocator from
    /// the largest existing key.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(Error::backend)?;

        // Ensure the table exists so read transactions never miss it.
        {
            let w = db.begin_write().map_err(Error::backend)?;
            w.open_table(BLOBS).map_err(Error::backend)?;
            w.commit().map_err(Error::backend)?;
        }

        // If the file is empty, start after the reserved root key.
        let max_key = {
            let r = db.begin_read().map_err(Error::backend)?;
            let table = r.open_table(BLOBS).map_err(Error::backend)?;
            let last = table.last().map_err(Error::backend)?;
            last.map(|(k, _)| k.value()).unwrap_or(ROOT_NODE_PKEY)
        };

        Ok(Self {
            db,
            path: path.to_path_buf(),
            next_key: AtomicU64::new(max_key.saturating_add(1)),
        })
    }

    /// Remove any existing file at `path` and open a fresh database.
    pub fn create_truncate(path: &Path) -> Result<Self> {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Pager for RedbPager {
    type Blob = Blob;

    fn alloc_many(&self, n: usize) -> Result<Vec<PhysicalKey>> {
        let n = u64::try_from(n)
            .map_err(|_| Error::Internal("alloc_many: n does not fit in u64".into()))?;

        let start = self
            .next_key
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                cur.checked_add(n)
            })
            .map_err(|_| Error::Internal("physical key space overflow".into()))?;

        Ok((start..start + n).collect())
    }

    fn batch_put(&self, puts: &[BatchPut]) -> Result<()> {
        let w = self.db.begin_write().map_err(Error::backend)?;
        {
            let mut table = w.open_table(BLOBS).map_err(Error::backend)?;
            for p in puts {
                match p {
                    BatchPut::Raw { key, bytes } => {
                        table
                            .insert(*key, bytes.as_slice())
                            .map_err(Error::backend)?;
                    }
                }
            }
        }
        w.commit().map_err(Error::backend)?;
        Ok(())
    }

    fn batch_get(&self, gets: &[BatchGet]) -> Result<Vec<GetResult<Self::Blob>>> {
        let r = self.db.begin_read().map_err(Error::backend)?;
        let table = r.open_table(BLOBS).map_err(Error::backend)?;
        let mut out = Vec::with_capacity(gets.len());
        for g in gets {
            match *g {
                BatchGet::Raw { key } => match table.get(key).map_err(Error::backend)? {
                    Some(v) => out.push(GetResult::Raw {
                        key,
                        bytes: Arc::from(v.value()),
                    }),
                    None => out.push(GetResult::Missing { key }),
                },
            }
        }
        Ok(out)
    }

    fn free_many(&self, keys: &[PhysicalKey]) -> Result<()> {
        let w = self.db.begin_write().map_err(Error::backend)?;
        {
            let mut table = w.open_table(BLOBS).map_err(Error::backend)?;
            for &k in keys {
                table.remove(k).map_err(Error::backend)?;
            }
        }
        w.commit().map_err(Error::backend)?;
        Ok(())
    }
}
