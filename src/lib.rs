//! ftscoord - coordination core for a sharded full-text search cluster
//!
//! This crate provides the shard topology, fanout/map-reduce execution
//! engine, streaming result merger, and compressed rune trie used to route
//! and merge queries across a sharded search cluster.
//!
//! # Architecture
//!
//! - **topology / router**: slot-based shard topology and key-to-shard routing
//! - **io**: pluggable per-shard connection (`ShardConn`) and a bounded work queue
//! - **barrier / fanout**: bounded concurrent dispatch and per-shard response tracking
//! - **cursor**: cursor-based streaming aggregation across shards
//! - **merger**: top-K/KNN/sortby result merging and aggregate-pipeline row streaming
//! - **profiler**: per-processor and per-shard profiling, surfaced via `PROFILE`
//! - **trie**: compressed rune trie with prefix/fuzzy/wildcard/range lookups
//!
//! # Key operations
//!
//! - Route a command to its owning shard or fan it out to every shard
//! - Merge per-shard search replies into a single ranked top-K result
//! - Stream aggregate rows across shard cursors until depleted
//! - Rewrite `KNN` arguments for shard-window-ratio candidate reduction
//! - Suggest completions via prefix, fuzzy (Levenshtein) and wildcard lookup

pub mod barrier;
pub mod command;
pub mod config;
pub mod cursor;
pub mod endpoint;
pub mod error;
pub mod fanout;
pub mod io;
pub mod merger;
pub mod profiler;
pub mod resp;
pub mod router;
pub mod topology;
pub mod trie;

pub use command::{Command, RootKind};
pub use config::{ClusterType, CoordinatorConfig, TimeoutPolicy};
pub use endpoint::Endpoint;
pub use error::{CoordError, Result};
pub use resp::Reply;
pub use router::{FanoutStrategy, Router};
pub use topology::{ClusterNode, ClusterShard, ClusterTopology, HashFunc, TopologyHandle};
