//! FIFO work queue with `size`/`pending`/`max_pending` counters (spec
//! section 4.2). Grounded on `prism-cluster/src/client.rs`'s connection-pool
//! bookkeeping, which tracks live connections under a lock and signals
//! completions; here the queue itself is the shared structure and
//! `tokio::sync::Notify` stands in for the teacher's async handle signal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// A FIFO work queue that backpressures once `pending` reaches
/// `max_pending`. `push` enqueues and wakes the drain loop; `done`
/// decrements `pending` and wakes anyone waiting on capacity.
pub struct WorkQueue<T> {
    items: parking_lot::Mutex<std::collections::VecDeque<T>>,
    pending: AtomicUsize,
    max_pending: usize,
    capacity: Semaphore,
    notify: Notify,
}

impl<T> WorkQueue<T> {
    pub fn new(max_pending: usize) -> Arc<Self> {
        Arc::new(WorkQueue {
            items: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            pending: AtomicUsize::new(0),
            max_pending,
            capacity: Semaphore::new(max_pending.max(1)),
            notify: Notify::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.items.lock().len()
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Enqueues `item`, blocking (async) until there's capacity under
    /// `max_pending`, then signals the drain loop.
    pub async fn push(&self, item: T) {
        let permit = self.capacity.acquire().await.expect("semaphore never closed");
        permit.forget();
        self.items.lock().push_back(item);
        self.pending.fetch_add(1, Ordering::Release);
        self.notify.notify_one();
    }

    /// Pops the next item in FIFO order, or `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Signals completion of one in-flight item, freeing capacity for the
    /// next `push`.
    pub fn done(&self) {
        self.pending.fetch_sub(1, Ordering::Release);
        self.capacity.add_permits(1);
    }

    pub async fn wait_for_item(&self) {
        self.notify.notified().await;
    }
}
