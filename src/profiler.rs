//! Profile reporter Wraps each result-processor with a
//! counting/timing proxy and assembles the coordinator + shard profile
//! sections of the reply. Metrics emission style (`metrics::histogram!`,
//! `metrics::counter!`) follows `prism-cluster/src/metrics.rs`'s
//! `record_rpc_duration`/`record_rpc_handler_duration` helpers.

use crate::resp::Reply;
use std::time::{Duration, Instant};

/// One node in the result-processor chain's profile (root to end).
#[derive(Debug, Clone)]
pub struct ProcessorProfile {
    pub processor_type: String,
    /// Cumulative time spent in this node, *excluding* time already
    /// attributed to upstream nodes
    pub own_time: Duration,
    pub count: u64,
}

/// A running timer for one processor node; `finish` reports both the
/// elapsed wall time and subtracts `upstream_time` already accounted for.
pub struct ProcessorTimer {
    processor_type: String,
    started_at: Instant,
}

impl ProcessorTimer {
    pub fn start(processor_type: impl Into<String>) -> Self {
        ProcessorTimer { processor_type: processor_type.into(), started_at: Instant::now() }
    }

    pub fn finish(self, upstream_time: Duration, count: u64) -> ProcessorProfile {
        let elapsed = self.started_at.elapsed();
        let own_time = elapsed.saturating_sub(upstream_time);
        metrics::histogram!("coord_processor_duration_seconds", "processor" => self.processor_type.clone())
            .record(own_time.as_secs_f64());
        metrics::counter!("coord_processor_rows_total", "processor" => self.processor_type.clone()).increment(count);
        ProcessorProfile { processor_type: self.processor_type, own_time, count }
    }
}

/// Per-shard profile segment as reported inline with a shard's reply
/// (: "Shard profile segments are reported in an outer
/// `Shards` section").
#[derive(Debug, Clone)]
pub struct ShardProfile {
    pub shard_id: usize,
    pub total_time: Duration,
    pub parsing_time: Duration,
}

/// The coordinator's own section: total, parsing, and pipeline-build
/// timings, plus the local processor chain.
#[derive(Debug, Clone)]
pub struct CoordinatorProfile {
    pub total_time: Duration,
    pub parsing_time: Duration,
    pub pipeline_build_time: Duration,
    pub processors: Vec<ProcessorProfile>,
}

/// Assembles the full profile reply: a coordinator section plus an outer
/// `Shards` section. Per the preserved divergence documented in
/// DESIGN.md (open question 1), a shard's profile segment is only merged
/// in when that shard's reply page produced at least one row — an empty
/// page's profile data is discarded along with the page, mirroring the
/// source's `profileSearch` log comment ("discard the profile info as
/// well").
pub fn build_profile_reply(
    coordinator: &CoordinatorProfile,
    shard_profiles: &[(ShardProfile, usize /* rows emitted by this page */)],
) -> Reply {
    let mut coord_map = vec![
        (Reply::bulk("Total time"), Reply::Double(coordinator.total_time.as_secs_f64() * 1000.0)),
        (Reply::bulk("Parsing time"), Reply::Double(coordinator.parsing_time.as_secs_f64() * 1000.0)),
        (Reply::bulk("Pipeline creation time"), Reply::Double(coordinator.pipeline_build_time.as_secs_f64() * 1000.0)),
    ];
    let processors: Vec<Reply> = coordinator
        .processors
        .iter()
        .map(|p| {
            Reply::Map(vec![
                (Reply::bulk("Type"), Reply::bulk(p.processor_type.clone())),
                (Reply::bulk("Time"), Reply::Double(p.own_time.as_secs_f64() * 1000.0)),
                (Reply::bulk("Counter"), Reply::Integer(p.count as i64)),
            ])
        })
        .collect();
    coord_map.push((Reply::bulk("Result processors profile"), Reply::Array(processors)));

    let shards: Vec<Reply> = shard_profiles
        .iter()
        .filter(|(_, rows)| *rows > 0)
        .map(|(sp, _)| {
            Reply::Map(vec![
                (Reply::bulk("Shard"), Reply::Integer(sp.shard_id as i64)),
                (Reply::bulk("Total time"), Reply::Double(sp.total_time.as_secs_f64() * 1000.0)),
                (Reply::bulk("Parsing time"), Reply::Double(sp.parsing_time.as_secs_f64() * 1000.0)),
            ])
        })
        .collect();

    Reply::Map(vec![(Reply::bulk("Coordinator"), Reply::Map(coord_map)), (Reply::bulk("Shards"), Reply::Array(shards))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reply_page_discards_its_profile_segment() {
        let coord = CoordinatorProfile {
            total_time: Duration::from_millis(5),
            parsing_time: Duration::from_millis(1),
            pipeline_build_time: Duration::from_millis(1),
            processors: vec![],
        };
        let shard_profiles = vec![
            (ShardProfile { shard_id: 0, total_time: Duration::from_millis(2), parsing_time: Duration::from_millis(1) }, 3),
            (ShardProfile { shard_id: 1, total_time: Duration::from_millis(2), parsing_time: Duration::from_millis(1) }, 0),
        ];
        let reply = build_profile_reply(&coord, &shard_profiles);
        if let Reply::Map(pairs) = &reply {
            let shards = pairs.iter().find(|(k, _)| k.as_bulk_str() == Some("Shards")).unwrap();
            if let Reply::Array(items) = &shards.1 {
                assert_eq!(items.len(), 1, "the empty-page shard's profile should be dropped");
            } else {
                panic!("expected array");
            }
        } else {
            panic!("expected map");
        }
    }

    #[test]
    fn processor_timer_subtracts_upstream_time() {
        let timer = ProcessorTimer::start("Index");
        std::thread::sleep(Duration::from_millis(5));
        let profile = timer.finish(Duration::from_millis(2), 10);
        assert!(profile.own_time < Duration::from_millis(6));
        assert_eq!(profile.count, 10);
    }
}
