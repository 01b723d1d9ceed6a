//! Shard connection abstraction. Grounded on `prism-cluster/src/client.rs`'s
//! `ClusterClient`/`PooledConnection`, with the QUIC transport abstracted
//! behind a trait — the per-shard wire server is an external collaborator,
//! so production code would implement `ShardConn` over a RESP-framed TCP
//! stream while tests use `FakeShardConn`.

use crate::command::Command;
use crate::error::{CoordError, Result};
use crate::resp::Reply;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[async_trait]
pub trait ShardConn: Send + Sync {
    async fn send(&self, cmd: &Command) -> Result<Reply>;
}

struct PooledConnection {
    conn: Arc<dyn ShardConn>,
    created_at: Instant,
}

/// Pools one connection per shard address, mirroring
/// `ClusterClient::connections: Arc<RwLock<HashMap<SocketAddr,
/// PooledConnection>>>`.
pub struct ShardPool {
    connections: RwLock<HashMap<String, PooledConnection>>,
    connect: Box<dyn Fn(&str) -> Arc<dyn ShardConn> + Send + Sync>,
}

impl ShardPool {
    pub fn new(connect: impl Fn(&str) -> Arc<dyn ShardConn> + Send + Sync + 'static) -> Self {
        ShardPool { connections: RwLock::new(HashMap::new()), connect: Box::new(connect) }
    }

    pub fn get_connection(&self, address: &str) -> Arc<dyn ShardConn> {
        if let Some(pooled) = self.connections.read().get(address) {
            return pooled.conn.clone();
        }
        let conn = (self.connect)(address);
        self.connections.write().insert(
            address.to_string(),
            PooledConnection { conn: conn.clone(), created_at: Instant::now() },
        );
        conn
    }

    pub fn pool_size(&self) -> usize {
        self.connections.read().len()
    }

    pub fn evict(&self, address: &str) {
        self.connections.write().remove(address);
    }
}

/// In-memory fake used by tests and by the in-process scenario harness;
/// stands in for the real shard wire protocol, which is out of scope.
pub struct FakeShardConn {
    pub scripted_replies: RwLock<std::collections::VecDeque<Reply>>,
    pub fail_next: std::sync::atomic::AtomicBool,
}

impl FakeShardConn {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(FakeShardConn {
            scripted_replies: RwLock::new(replies.into()),
            fail_next: std::sync::atomic::AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl ShardConn for FakeShardConn {
    async fn send(&self, _cmd: &Command) -> Result<Reply> {
        if self.fail_next.swap(false, std::sync::atomic::Ordering::SeqCst) {
            return Err(CoordError::Connection("fake connection failure".into()));
        }
        self.scripted_replies
            .write()
            .pop_front()
            .ok_or_else(|| CoordError::Connection("fake shard exhausted scripted replies".into()))
    }
}
