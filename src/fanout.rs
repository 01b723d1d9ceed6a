//! Fanout execution engine: `FanoutContext`/`MR_Fanout`/
//! `MR_Map`. Generalized from `prism-cluster/src/federation/mod.rs`'s
//! `FederatedSearch::scatter_gather` (bounded concurrency via
//! `tokio::sync::Semaphore`, optional deadline via `tokio::time::timeout`,
//! `futures::future::join_all` over per-shard futures) to the
//! strategy-driven, reducer-based shape in `original_source/coord/src/rmr/rmr.c`'s
//! `MRCtx` (fields `numReplied`/`numExpected`/`numErrored`/`replies`/
//! `reducer`/`strategy`/`protocol`/`cmds`).

use crate::command::Command;
use crate::error::{CoordError, Result};
use crate::io::connection::ShardPool;
use crate::resp::Reply;
use crate::router::{FanoutStrategy, Router};
use crate::topology::ClusterTopology;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// One shard's outcome from a fanout round.
#[derive(Debug, Clone)]
pub enum ShardOutcome {
    Reply(Reply),
    Error(String),
}

/// Per-request fanout state (`FanoutContext`/`MRCtx`).
pub struct FanoutContext {
    pub expected: AtomicU32,
    pub replied: AtomicU32,
    pub errored: AtomicU32,
    pub replies: parking_lot::Mutex<Vec<(usize, ShardOutcome)>>,
    pub strategy: FanoutStrategy,
    pub protocol: u8,
    pub commands: Vec<Command>,
    /// A terminal in-place reducer (: "if present, the
    /// blocked client is not unblocked — the reducer will itself decide
    /// when to unblock after issuing follow-up commands"). `None` means
    /// the ordinary single-shot reducer path is used.
    pub terminal_reducer: Option<()>,
}

impl FanoutContext {
    pub fn new(strategy: FanoutStrategy, protocol: u8) -> Self {
        FanoutContext {
            expected: AtomicU32::new(0),
            replied: AtomicU32::new(0),
            errored: AtomicU32::new(0),
            replies: parking_lot::Mutex::new(Vec::new()),
            strategy,
            protocol,
            commands: Vec::new(),
            terminal_reducer: None,
        }
    }

    pub fn is_done(&self) -> bool {
        let expected = self.expected.load(Ordering::Acquire);
        self.replied.load(Ordering::Acquire) + self.errored.load(Ordering::Acquire) == expected
    }
}

/// `MR_Fanout(ctx, reducer, cmd, block)`: dispatch one command to every
/// shard per `ctx.strategy`, collect replies with bounded concurrency and
/// an optional overall deadline. Returns the outcomes in arrival order
/// (shard index preserved per outcome so the merger can tell which shard
/// each reply came from); `replies_received <= expected` and at
/// termination `replied + errored == expected`.
pub async fn mr_fanout(
    ctx: &FanoutContext,
    topology: &ClusterTopology,
    pool: &ShardPool,
    cmd: &Command,
    max_concurrency: usize,
    deadline: Option<Duration>,
    allow_partial: bool,
) -> Result<Vec<(usize, ShardOutcome)>> {
    let router = Router::new(topology);
    let targets = router.fanout_targets(ctx.strategy);
    if targets.is_empty() {
        return Err(CoordError::NoShardsReachable);
    }
    ctx.expected.store(targets.len() as u32, Ordering::Release);

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let cmd = cmd.clone();
    let futures: Vec<_> = targets
        .iter()
        .enumerate()
        .map(|(shard_idx, target)| {
            let semaphore = semaphore.clone();
            let address = target
                .shard
                .nodes
                .get(target.node_index)
                .map(|n| n.endpoint.to_string())
                .unwrap_or_default();
            let conn = pool.get_connection(&address);
            let cmd = cmd.clone();
            async move {
                let _permit = semaphore.acquire().await.ok();
                let result = conn.send(&cmd).await;
                (shard_idx, result)
            }
        })
        .collect();

    let results = if let Some(deadline) = deadline {
        match tokio::time::timeout(deadline, futures::future::join_all(futures)).await {
            Ok(results) => results,
            Err(_) => {
                if allow_partial {
                    warn!("fanout deadline exceeded, returning partial results");
                    Vec::new()
                } else {
                    return Err(CoordError::Timeout);
                }
            }
        }
    } else {
        futures::future::join_all(futures).await
    };

    let mut outcomes = Vec::with_capacity(results.len());
    for (shard_idx, result) in results {
        match result {
            Ok(reply) => {
                if reply.is_error() {
                    ctx.errored.fetch_add(1, Ordering::AcqRel);
                    let msg = reply.as_bulk_str().unwrap_or("shard error").to_string();
                    outcomes.push((shard_idx, ShardOutcome::Error(msg)));
                } else {
                    ctx.replied.fetch_add(1, Ordering::AcqRel);
                    outcomes.push((shard_idx, ShardOutcome::Reply(reply)));
                }
            }
            Err(e) => {
                ctx.errored.fetch_add(1, Ordering::AcqRel);
                debug!(shard = shard_idx, error = %e, "shard fanout failed");
                outcomes.push((shard_idx, ShardOutcome::Error(e.to_string())));
            }
        }
    }

    if outcomes.is_empty() && !allow_partial {
        return Err(CoordError::Timeout);
    }

    let error_count = outcomes.iter().filter(|(_, o)| matches!(o, ShardOutcome::Error(_))).count();
    if error_count == outcomes.len() && !outcomes.is_empty() {
        // Zero non-error replies: propagate the last shard error as the
        // request's error (ShardError).
        if let Some((_, ShardOutcome::Error(msg))) = outcomes.last() {
            return Err(CoordError::ShardError { shard_id: outcomes.len() - 1, message: msg.clone() });
        }
    }

    Ok(outcomes)
}

/// `MR_Map(ctx, reducer, generator, block)`: dispatch a distinct per-shard
/// command stream, one command per shard.
pub async fn mr_map(
    ctx: &FanoutContext,
    topology: &ClusterTopology,
    pool: &ShardPool,
    per_shard_commands: &[Command],
    max_concurrency: usize,
) -> Result<Vec<(usize, ShardOutcome)>> {
    let router = Router::new(topology);
    let targets = router.fanout_targets(ctx.strategy);
    if targets.is_empty() || per_shard_commands.is_empty() {
        return Err(CoordError::NoShardsReachable);
    }
    ctx.expected.store(per_shard_commands.len() as u32, Ordering::Release);

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let futures: Vec<_> = per_shard_commands
        .iter()
        .enumerate()
        .zip(targets.iter().cycle())
        .map(|((shard_idx, cmd), target)| {
            let semaphore = semaphore.clone();
            let address = target
                .shard
                .nodes
                .get(target.node_index)
                .map(|n| n.endpoint.to_string())
                .unwrap_or_default();
            let conn = pool.get_connection(&address);
            let cmd = cmd.clone();
            async move {
                let _permit = semaphore.acquire().await.ok();
                let result = conn.send(&cmd).await;
                (shard_idx, result)
            }
        })
        .collect();

    let results = futures::future::join_all(futures).await;
    let mut outcomes = Vec::with_capacity(results.len());
    for (shard_idx, result) in results {
        match result {
            Ok(reply) if !reply.is_error() => {
                ctx.replied.fetch_add(1, Ordering::AcqRel);
                outcomes.push((shard_idx, ShardOutcome::Reply(reply)));
            }
            Ok(reply) => {
                ctx.errored.fetch_add(1, Ordering::AcqRel);
                outcomes.push((shard_idx, ShardOutcome::Error(reply.as_bulk_str().unwrap_or("").to_string())));
            }
            Err(e) => {
                ctx.errored.fetch_add(1, Ordering::AcqRel);
                outcomes.push((shard_idx, ShardOutcome::Error(e.to_string())));
            }
        }
    }
    Ok(outcomes)
}
