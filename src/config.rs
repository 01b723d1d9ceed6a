//! Coordinator configuration
//!
//! Recognized options mirror ; ambient I/O-runtime knobs are
//! carried alongside them the way `prism-cluster/src/config.rs` carries
//! `ClusterTlsConfig`/`HealthConfig` next to its core fields.

use serde::{Deserialize, Serialize};

/// Cluster type as reported by `CLUSTERINFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    Oss,
    Enterprise,
}

impl Default for ClusterType {
    fn default() -> Self {
        ClusterType::Oss
    }
}

/// What the coordinator does when a fanout's deadline fires with partial
/// results already collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Emit whatever was collected, with a warning marker in the reply.
    Return,
    /// Surface the timeout as the request's error.
    Fail,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        TimeoutPolicy::Return
    }
}

/// Coordinator-level configuration, corresponding to module-load options
/// `PARTITIONS`, `TYPE`, `TIMEOUT`, `GLOBALPASS`, `CONN_PER_SHARD` (spec
/// section 6.3), plus the ambient I/O-runtime knobs every coordinator needs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoordinatorConfig {
    /// `PARTITIONS n` — number of shards in the topology.
    #[serde(default = "default_partitions")]
    pub partitions: u32,

    /// `TYPE oss|enterprise`.
    #[serde(default)]
    pub cluster_type: ClusterType,

    /// `TIMEOUT ms` — default fanout deadline.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// `GLOBALPASS secret` — password used for all shard connections unless
    /// an endpoint specifies its own.
    #[serde(default)]
    pub global_password: Option<String>,

    /// `CONN_PER_SHARD m` — 0 means auto (one connection per I/O thread).
    #[serde(default)]
    pub conn_per_shard: u32,

    /// Number of I/O-runtime event-loop threads ().
    #[serde(default = "default_io_threads")]
    pub io_threads: usize,

    /// Work-queue backpressure limit ().
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,

    /// Bounded reply-channel capacity for cursor iteration ().
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// What happens on a fired deadline with partial results collected.
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,

    /// Shard-window-ratio default for KNN requests that don't specify one.
    #[serde(default = "default_shard_window_ratio")]
    pub shard_window_ratio: f64,
}

fn default_partitions() -> u32 {
    1
}

fn default_timeout_ms() -> u64 {
    500
}

fn default_io_threads() -> usize {
    1
}

fn default_max_pending() -> usize {
    1024
}

fn default_channel_capacity() -> usize {
    256
}

fn default_shard_window_ratio() -> f64 {
    1.0
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            partitions: default_partitions(),
            cluster_type: ClusterType::default(),
            timeout_ms: default_timeout_ms(),
            global_password: None,
            conn_per_shard: 0,
            io_threads: default_io_threads(),
            max_pending: default_max_pending(),
            channel_capacity: default_channel_capacity(),
            timeout_policy: TimeoutPolicy::default(),
            shard_window_ratio: default_shard_window_ratio(),
        }
    }
}
