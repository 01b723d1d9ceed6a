//! Key-to-shard routing. Generalized from
//! `prism-cluster/src/federation/router.rs`'s `QueryRouter`/`RoutingStrategy`
//! (which hashed via `DefaultHasher` over an abstract `ClusterState`) to the
//! slot-based CRC16/CRC12 model this coordinator needs, with CRC tables
//! following the layout used by Redis-protocol client crates in the
//! retrieval pack (the `aseio6668-Paradigm`/redis-cluster-routing style
//! lookup table).

use crate::command::Command;
use crate::error::{CoordError, Result};
use crate::topology::{ClusterShard, ClusterTopology, HashFunc};

/// Fanout dispatch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutStrategy {
    /// Send to node 0 (primary) of each shard only.
    MastersOnly,
    /// One connection per (shard, node) pair, deterministically chosen.
    FlatCoordination,
    /// Prefer shards colocated with the local node.
    LocalCoordination,
}

impl Default for FanoutStrategy {
    fn default() -> Self {
        FanoutStrategy::MastersOnly
    }
}

/// CRC16/XMODEM, the table Redis Cluster uses for slot hashing.
const CRC16_TAB: [u16; 256] = build_crc16_table();

const fn build_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 };
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        let idx = (((crc >> 8) ^ byte as u16) & 0xFF) as usize;
        crc = (crc << 8) ^ CRC16_TAB[idx];
    }
    crc
}

/// CRC12, used by smaller (enterprise) partition counts. Polynomial 0x80F,
/// reflected, matching the original coordinator's smaller hash space.
pub fn crc12(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 4;
        for _ in 0..8 {
            if crc & 0x800 != 0 {
                crc = (crc << 1) ^ 0x80F;
            } else {
                crc <<= 1;
            }
            crc &= 0xFFF;
        }
    }
    crc & 0xFFF
}

/// Hashtag-aware key extraction: if the key contains `{...}`, only the
/// bracketed portion participates in hashing (Redis Cluster convention,
/// carried here since shard keys are index names that may be hash-tagged
/// to colocate related indices).
fn hash_key(key: &[u8]) -> &[u8] {
    if let Some(open) = key.iter().position(|&b| b == b'{') {
        if let Some(close_rel) = key[open + 1..].iter().position(|&b| b == b'}') {
            if close_rel > 0 {
                return &key[open + 1..open + 1 + close_rel];
            }
        }
    }
    key
}

pub fn slot_for_key(key: &[u8], hash_func: HashFunc, num_slots: u32) -> u16 {
    if num_slots == 0 {
        return 0;
    }
    let tag = hash_key(key);
    let hash = match hash_func {
        HashFunc::Crc16 => crc16(tag) as u32,
        HashFunc::Crc12 => crc12(tag) as u32,
        HashFunc::None => tag.iter().fold(0u32, |acc, &b| acc.wrapping_mul(31).wrapping_add(b as u32)),
    };
    (hash % num_slots) as u16
}

pub struct ShardTarget<'a> {
    pub shard: &'a ClusterShard,
    pub node_index: usize,
}

pub struct Router<'a> {
    pub topology: &'a ClusterTopology,
    pub my_node_id: Option<&'a str>,
}

impl<'a> Router<'a> {
    pub fn new(topology: &'a ClusterTopology) -> Self {
        Router { topology, my_node_id: None }
    }

    /// Resolves the slot for a command: explicit `target_slot` wins (spec
    /// section 4.1), else it's derived from the key (arg 1).
    pub fn slot_for_command(&self, cmd: &Command) -> Result<u16> {
        if cmd.target_slot >= 0 {
            return Ok(cmd.target_slot as u16);
        }
        let key = cmd
            .key()
            .ok_or_else(|| CoordError::ParseArgs { offset: 1, message: "command missing sharding key".into() })?;
        Ok(slot_for_key(key, self.topology.hash_func, self.topology.num_slots))
    }

    pub fn shard_for_command(&self, cmd: &Command) -> Result<&'a ClusterShard> {
        let slot = self.slot_for_command(cmd)?;
        self.topology
            .shard_for_slot(slot)
            .ok_or(CoordError::NoShardsReachable)
    }

    /// Builds the dispatch target list for a fanout across every shard,
    /// per the requested strategy.
    pub fn fanout_targets(&self, strategy: FanoutStrategy) -> Vec<ShardTarget<'a>> {
        if self.topology.shards.is_empty() {
            return Vec::new();
        }
        match strategy {
            FanoutStrategy::MastersOnly => self
                .topology
                .shards
                .iter()
                .filter(|s| !s.nodes.is_empty())
                .map(|shard| ShardTarget { shard, node_index: 0 })
                .collect(),
            FanoutStrategy::FlatCoordination => self
                .topology
                .shards
                .iter()
                .flat_map(|shard| (0..shard.nodes.len()).map(move |i| ShardTarget { shard, node_index: i }))
                .collect(),
            FanoutStrategy::LocalCoordination => {
                let my_id = self.my_node_id;
                self.topology
                    .shards
                    .iter()
                    .filter(|s| !s.nodes.is_empty())
                    .map(|shard| {
                        let node_index = my_id
                            .and_then(|id| shard.nodes.iter().position(|n| n.id == id))
                            .unwrap_or(0);
                        ShardTarget { shard, node_index }
                    })
                    .collect()
            }
        }
    }
}
