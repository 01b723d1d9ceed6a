//! I/O runtime: work queue and shard connection pooling.
//!
//! Grounded on `prism-cluster/src/client.rs`'s `ClusterClient`/
//! `PooledConnection` pattern, with the QUIC transport replaced by a
//! `ShardConn` trait so the fanout engine can be tested against an
//! in-memory fake without a real network (the per-shard wire server is out
//! of scope).

pub mod connection;
pub mod queue;

pub use connection::{FakeShardConn, ShardConn, ShardPool};
pub use queue::WorkQueue;
