//! Coordinator error types

use thiserror::Error;

/// Errors that can occur while routing, fanning out, or merging a request.
#[derive(Error, Debug, Clone)]
pub enum CoordError {
    #[error("ERRCLUSTER Uninitialized cluster state, could not perform command")]
    ClusterDown,

    #[error("invalid arguments at offset {offset}: {message}")]
    ParseArgs { offset: usize, message: String },

    #[error("shard {shard_id} returned an error: {message}")]
    ShardError { shard_id: usize, message: String },

    #[error("Timeout calling command")]
    Timeout,

    #[error("could not parse redisearch results: {0}")]
    Protocol(String),

    #[error("QUERY_WINDEXING_FAILURE: {0}")]
    Resource(String),

    #[error("Could not distribute command")]
    NoShardsReachable,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoordError {
    /// Get the error type as a string for metrics labeling.
    pub fn error_type(&self) -> &'static str {
        match self {
            CoordError::ClusterDown => "cluster_down",
            CoordError::ParseArgs { .. } => "parse_args",
            CoordError::ShardError { .. } => "shard_error",
            CoordError::Timeout => "timeout",
            CoordError::Protocol(_) => "protocol",
            CoordError::Resource(_) => "resource",
            CoordError::NoShardsReachable => "no_shards_reachable",
            CoordError::Connection(_) => "connection",
            CoordError::Config(_) => "config",
        }
    }
}

impl From<std::io::Error> for CoordError {
    fn from(err: std::io::Error) -> Self {
        CoordError::Connection(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoordError>;
