//! `MRIterator`: multi-shard cursor streaming with backpressure (spec
//! section 4.5). Grounded on description directly, with channel
//! bookkeeping in the style of `prism-cluster/src/client.rs`'s connection
//! tracking (shared state behind a lock plus atomics for hot counters).

use crate::command::{Command, RootKind};
use crate::resp::Reply;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use tokio::sync::mpsc;

/// Per-shard cursor bookkeeping; `CallbackCtx` in 
pub struct ShardCursor {
    pub shard_index: usize,
    pub cursor_id: u64,
    pub command: Command,
    pub depleted: bool,
}

impl ShardCursor {
    pub fn new(shard_index: usize, command: Command) -> Self {
        ShardCursor { shard_index, cursor_id: 0, command, depleted: false }
    }

    /// Rewrites this shard's command from `CURSOR READ` to `CURSOR DEL`
    /// (cancellation, 4.5 step 4).
    pub fn rewrite_to_del(&mut self) {
        if let Some(pos) = self.command.args.iter().position(|a| a == b"READ") {
            self.command.replace(pos, "DEL".as_bytes().to_vec());
        }
        self.command.root_kind = RootKind::CursorDel;
    }
}

/// Streaming multi-shard cursor (`Iterator (MRIterator)`).
pub struct MrIterator {
    pub shards: Vec<ShardCursor>,
    pub channel_tx: mpsc::Sender<Reply>,
    pub channel_rx: mpsc::Receiver<Reply>,
    /// Release/acquire
    pub pending: AtomicI32,
    pub in_process: AtomicI32,
    /// Relaxed; re-checked on every loop ().
    pub timed_out: AtomicBool,
}

impl MrIterator {
    pub fn new(shards: Vec<ShardCursor>, channel_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        MrIterator {
            shards,
            channel_tx: tx,
            channel_rx: rx,
            pending: AtomicI32::new(0),
            in_process: AtomicI32::new(0),
            timed_out: AtomicBool::new(false),
        }
    }

    /// On each pop: a `cursor_id != 0` in a reply means the shard is still
    /// producing; otherwise it's marked depleted (step 2).
    pub fn note_cursor_reply(&mut self, shard_index: usize, cursor_id: u64) {
        if let Some(shard) = self.shards.iter_mut().find(|s| s.shard_index == shard_index) {
            shard.cursor_id = cursor_id;
            shard.depleted = cursor_id == 0;
        }
    }

    pub fn all_depleted(&self) -> bool {
        self.shards.iter().all(|s| s.depleted)
    }

    /// `manually_trigger_next(threshold)` (step 3): if
    /// nothing is currently in flight and the channel has drained to at or
    /// below `threshold`, re-invoke `CURSOR READ` on every non-depleted
    /// shard. Returns the commands to dispatch.
    pub fn manually_trigger_next(&mut self, channel_len: usize, threshold: usize) -> Vec<&Command> {
        if self.in_process.load(Ordering::Acquire) != 0 || channel_len > threshold {
            return Vec::new();
        }
        let non_depleted: Vec<&ShardCursor> = self.shards.iter().filter(|s| !s.depleted).collect();
        let count = non_depleted.len() as i32;
        self.in_process.store(count, Ordering::Release);
        self.pending.store(count, Ordering::Release);
        non_depleted.into_iter().map(|s| &s.command).collect()
    }

    /// Called when one shard's round-trip completes, decrementing both
    /// counters (: release/acquire ordering).
    pub fn complete_one(&self) {
        self.in_process.fetch_sub(1, Ordering::AcqRel);
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }

    /// On timeout: rewrite every pending (non-depleted) shard's command
    /// from `CURSOR READ` to `CURSOR DEL` so shards release resources
    /// (step 4, 4.2 cancellation).
    pub fn convert_pending_to_del(&mut self) {
        self.timed_out.store(true, Ordering::Relaxed);
        for shard in self.shards.iter_mut() {
            if !shard.depleted {
                shard.rewrite_to_del();
            }
        }
    }

    /// `wait_done(may_be_idle)` (step 5): spins until
    /// `in_process == 0`; if `pending > 0` at that point the DEL sweep must
    /// have been issued by the caller before calling this. Freeing the
    /// iterator before this returns is a use-after-free ()
    /// so this is modeled as an async wait rather than a raw spin.
    pub async fn wait_done(&self) {
        while self.in_process.load(Ordering::Acquire) != 0 {
            tokio::task::yield_now().await;
        }
    }
}
