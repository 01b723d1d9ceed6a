//! `ShardResponseBarrier` for WITHCOUNT.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

/// Holds the coordinator until every shard's first reply (carrying
/// `total_results`) has arrived, so the accurate pre-limit total can be
/// emitted before any row streams out.
pub struct ShardResponseBarrier {
    num_shards: usize,
    responded: Vec<AtomicBool>,
    num_responded: AtomicUsize,
    accumulated_total: AtomicI64,
    has_error: AtomicBool,
}

impl ShardResponseBarrier {
    pub fn new(num_shards: usize) -> Self {
        ShardResponseBarrier {
            num_shards,
            responded: (0..num_shards).map(|_| AtomicBool::new(false)).collect(),
            num_responded: AtomicUsize::new(0),
            accumulated_total: AtomicI64::new(0),
            has_error: AtomicBool::new(false),
        }
    }

    /// Records the first reply from shard `index`, carrying `total_results`.
    /// Idempotent per shard: a second call for the same index is ignored
    /// (only the first reply per shard carries a fresh total).
    pub fn record(&self, index: usize, total_results: i64) {
        if self.responded[index].swap(true, Ordering::AcqRel) {
            return;
        }
        self.accumulated_total.fetch_add(total_results, Ordering::AcqRel);
        self.num_responded.fetch_add(1, Ordering::AcqRel);
    }

    /// Any shard error short-circuits the barrier.
    pub fn record_error(&self, index: usize) {
        if self.responded[index].swap(true, Ordering::AcqRel) {
            return;
        }
        self.has_error.store(true, Ordering::Release);
        self.num_responded.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_complete(&self) -> bool {
        self.num_responded.load(Ordering::Acquire) == self.num_shards
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::Acquire)
    }

    pub fn accumulated_total(&self) -> i64 {
        self.accumulated_total.load(Ordering::Acquire)
    }

    pub fn num_responded(&self) -> usize {
        self.num_responded.load(Ordering::Acquire)
    }
}
