use crate::pager::{BatchGet, BatchPut, GetResult, Pager};
use crate::types::PhysicalKey;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use sydata_result::Result;

/// A thread-safe container for pager I/O statistics.
#[derive(Debug, Default)]
pub struct IoStats {
    // --- Total individual items ---
    pub physical_gets: AtomicU64,
    pub physical_puts: AtomicU64,
    pub physical_frees: AtomicU64,
    pub physical_allocs: AtomicU64,

    // --- Total batch operations (i.e., calls to the pager) ---
    pub get_batches: AtomicU64,
    pub put_batches: AtomicU64,

    // --- Byte volume ---
    pub bytes_read: AtomicU64,
    pub bytes_written: AtomicU64,

    // --- Write classifications ---
    pub fresh_puts: AtomicU64,
    pub overwritten_puts: AtomicU64,
}

impl IoStats {
    /// Capture a point-in-time snapshot of the accumulated metrics.
    pub fn snapshot(&self) -> IoStatsSnapshot {
        IoStatsSnapshot {
            physical_gets: self.physical_gets.load(Ordering::Relaxed),
            physical_puts: self.physical_puts.load(Ordering::Relaxed),
            physical_frees: self.physical_frees.load(Ordering::Relaxed),
            physical_allocs: self.physical_allocs.load(Ordering::Relaxed),
            get_batches: self.get_batches.load(Ordering::Relaxed),
            put_batches: self.put_batches.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            fresh_puts: self.fresh_puts.load(Ordering::Relaxed),
            overwritten_puts: self.overwritten_puts.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics to zero.
    pub fn reset(&self) {
        for counter in [
            &self.physical_gets,
            &self.physical_puts,
            &self.physical_frees,
            &self.physical_allocs,
            &self.get_batches,
            &self.put_batches,
            &self.bytes_read,
            &self.bytes_written,
            &self.fresh_puts,
            &self.overwritten_puts,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Immutable copy of [`IoStats`] counters captured at a specific moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStatsSnapshot {
    pub physical_gets: u64,
    pub physical_puts: u64,
    pub physical_frees: u64,
    pub physical_allocs: u64,
    pub get_batches: u64,
    pub put_batches: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub fresh_puts: u64,
    pub overwritten_puts: u64,
}

impl IoStatsSnapshot {
    /// Compute the delta between two snapshots (`newer - older`). Saturates at zero.
    pub fn delta_since(&self, older: &Self) -> Self {
        macro_rules! delta {
            ($field:ident) => {
                self.$field.saturating_sub(older.$field)
            };
        }

        Self {
            physical_gets: delta!(physical_gets),
            physical_puts: delta!(physical_puts),
            physical_frees: delta!(physical_frees),
            physical_allocs: delta!(physical_allocs),
            get_batches: delta!(get_batches),
            put_batches: delta!(put_batches),
            bytes_read: delta!(bytes_read),
            bytes_written: delta!(bytes_written),
            fresh_puts: delta!(fresh_puts),
            overwritten_puts: delta!(overwritten_puts),
        }
    }

    /// Average physical put operations per batch.
    pub fn puts_per_batch(&self) -> f64 {
        if self.put_batches == 0 {
            0.0
        } else {
            self.physical_puts as f64 / self.put_batches as f64
        }
    }
}

/// A wrapper around any Pager implementation that instruments I/O operations.
#[derive(Debug)]
pub struct InstrumentedPager<P: Pager> {
    inner: P,
    stats: Arc<IoStats>,
    written: Mutex<FxHashSet<PhysicalKey>>,
}

impl<P> InstrumentedPager<P>
where
    P: Pager,
{
    /// Wraps a Pager and returns the instrumented version along with a handle
    /// to its statistics.
    pub fn new(inner: P) -> (Self, Arc<IoStats>) {
        let stats = Arc::new(IoStats::default());
        (
            Self {
                inner,
                stats: Arc::clone(&stats),
                written: Mutex::new(FxHashSet::default()),
            },
            stats,
        )
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P> Pager for InstrumentedPager<P>
where
    P: Pager,
{
    type Blob = P::Blob;

    fn batch_get(&self, gets: &[BatchGet]) -> Result<Vec<GetResult<Self::Blob>>> {
        self.stats
            .physical_gets
            .fetch_add(gets.len() as u64, Ordering::Relaxed);
        self.stats.get_batches.fetch_add(1, Ordering::Relaxed);
        let results = self.inner.batch_get(gets)?;
        let read: usize = results
            .iter()
            .map(|r| match r {
                GetResult::Raw { bytes, .. } => bytes.as_ref().len(),
                GetResult::Missing { .. } => 0,
            })
            .sum();
        self.stats
            .bytes_read
            .fetch_add(read as u64, Ordering::Relaxed);
        Ok(results)
    }

    fn batch_put(&self, puts: &[BatchPut]) -> Result<()> {
        self.stats
            .physical_puts
            .fetch_add(puts.len() as u64, Ordering::Relaxed);
        self.stats.put_batches.fetch_add(1, Ordering::Relaxed);
        {
            let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
            for put in puts {
                match put {
                    BatchPut::Raw { key, bytes } => {
                        self.stats
                            .bytes_written
                            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                        if written.insert(*key) {
                            self.stats.fresh_puts.fetch_add(1, Ordering::Relaxed);
                        } else {
                            self.stats.overwritten_puts.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            }
        }
        self.inner.batch_put(puts)
    }

    fn alloc_many(&self, count: usize) -> Result<Vec<PhysicalKey>> {
        self.stats
            .physical_allocs
            .fetch_add(count as u64, Ordering::Relaxed);
        self.inner.alloc_many(count)
    }

    fn free_many(&self, keys: &[PhysicalKey]) -> Result<()> {
        self.stats
            .physical_frees
            .fetch_add(keys.len() as u64, Ordering::Relaxed);
        {
            let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
            for key in keys {
                written.remove(key);
            }
        }
        self.inner.free_many(keys)
    }
}
