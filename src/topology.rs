//! Shard topology model and atomic snapshot swapping
//!
//! Grounded on `prism-cluster/src/placement/state.rs`'s `ClusterState`,
//! which wraps its mutable maps in `parking_lot::RwLock` and hands snapshots
//! to callers; here the whole topology is one `Arc`, swapped wholesale under
//! a lock rather than mutated field-by-field, since a `CLUSTERSET` update
//! must land atomically (: "succeed atomically or not at
//! all").

use crate::endpoint::Endpoint;
use parking_lot::RwLock;
use std::sync::Arc;

/// `ClusterNode.flags` A plain bitset rather than a
/// `bitflags`-crate type, since the teacher's dependency table doesn't
/// carry that crate and three bits don't warrant adding one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const MASTER: NodeFlags = NodeFlags(0b001);
    pub const SELF: NodeFlags = NodeFlags(0b010);
    pub const COORDINATOR: NodeFlags = NodeFlags(0b100);

    pub fn empty() -> Self {
        NodeFlags(0)
    }

    pub fn contains(self, other: NodeFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for NodeFlags {
    type Output = NodeFlags;
    fn bitor(self, rhs: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    pub id: String,
    pub endpoint: Endpoint,
    pub flags: NodeFlags,
}

impl ClusterNode {
    pub fn is_master(&self) -> bool {
        self.flags.contains(NodeFlags::MASTER)
    }

    pub fn is_self(&self) -> bool {
        self.flags.contains(NodeFlags::SELF)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterShard {
    pub slot_ranges: Vec<(u16, u16)>,
    pub nodes: Vec<ClusterNode>,
}

impl ClusterShard {
    /// Node 0 is always the primary
    pub fn primary(&self) -> Option<&ClusterNode> {
        self.nodes.first()
    }

    pub fn replicas(&self) -> &[ClusterNode] {
        if self.nodes.len() > 1 {
            &self.nodes[1..]
        } else {
            &[]
        }
    }

    pub fn contains_slot(&self, slot: u16) -> bool {
        self.slot_ranges.iter().any(|(start, end)| slot >= *start && slot <= *end)
    }

    pub fn has_node(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == node_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunc {
    Crc16,
    Crc12,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterTopology {
    pub hash_func: HashFunc,
    pub num_slots: u32,
    pub shards: Vec<ClusterShard>,
}

impl ClusterTopology {
    pub fn empty() -> Self {
        ClusterTopology { hash_func: HashFunc::None, num_slots: 0, shards: Vec::new() }
    }

    /// Checks the section-3 invariant: slot ranges partition `[0,
    /// num_slots)` exactly (no gaps, no overlaps).
    pub fn validate(&self) -> Result<(), String> {
        let mut ranges: Vec<(u16, u16)> =
            self.shards.iter().flat_map(|s| s.slot_ranges.iter().copied()).collect();
        ranges.sort_unstable();
        let mut expected_next: u32 = 0;
        for (start, end) in &ranges {
            if *start as u32 != expected_next {
                return Err(format!(
                    "slot range gap or overlap: expected start {expected_next}, got {start}"
                ));
            }
            if end < start {
                return Err(format!("inverted slot range ({start}, {end})"));
            }
            expected_next = *end as u32 + 1;
        }
        if expected_next != self.num_slots {
            return Err(format!(
                "slot ranges cover [0, {expected_next}) but num_slots is {}",
                self.num_slots
            ));
        }
        Ok(())
    }

    pub fn shard_for_slot(&self, slot: u16) -> Option<&ClusterShard> {
        // Binary search over sorted slot_ranges
        let mut lo = 0usize;
        let mut hi = self.shards.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let shard = &self.shards[mid];
            let first = shard.slot_ranges.first()?;
            if slot < first.0 {
                hi = mid;
            } else if shard.contains_slot(slot) {
                return Some(shard);
            } else {
                lo = mid + 1;
            }
        }
        // Fallback linear scan: shards need not be sorted by slot if built
        // out of CLUSTERSET's declaration order.
        self.shards.iter().find(|s| s.contains_slot(slot))
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Which shard (if any) contains the node flagged `SELF`.
    pub fn my_shard(&self) -> Option<&ClusterShard> {
        self.shards.iter().find(|s| s.nodes.iter().any(|n| n.is_self()))
    }
}

/// Reference-counted, atomically swappable topology handle (
/// "Lifecycle": "topology objects are reference-counted snapshots, swapped
/// atomically when an update lands; readers obtain the current snapshot and
/// keep it for the duration of one fanout").
#[derive(Debug)]
pub struct TopologyHandle {
    inner: RwLock<Arc<ClusterTopology>>,
}

impl TopologyHandle {
    pub fn new(topology: ClusterTopology) -> Self {
        TopologyHandle { inner: RwLock::new(Arc::new(topology)) }
    }

    /// Obtain the current snapshot; the caller should hold onto this `Arc`
    /// for the lifetime of one fanout rather than re-reading it mid-flight.
    pub fn snapshot(&self) -> Arc<ClusterTopology> {
        self.inner.read().clone()
    }

    /// Atomically replaces the topology. Returns the previous snapshot in
    /// case the caller wants to log what changed.
    pub fn swap(&self, new_topology: ClusterTopology) -> Arc<ClusterTopology> {
        let new_arc = Arc::new(new_topology);
        let mut guard = self.inner.write();
        std::mem::replace(&mut *guard, new_arc)
    }
}

impl Default for TopologyHandle {
    fn default() -> Self {
        TopologyHandle::new(ClusterTopology::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, master: bool) -> ClusterNode {
        ClusterNode {
            id: id.into(),
            endpoint: Endpoint::tcp("127.0.0.1", 6379),
            flags: if master { NodeFlags::MASTER } else { NodeFlags::empty() },
        }
    }

    fn topology(ranges: &[(u16, u16)], num_slots: u32) -> ClusterTopology {
        ClusterTopology {
            hash_func: HashFunc::Crc16,
            num_slots,
            shards: ranges
                .iter()
                .enumerate()
                .map(|(i, &(s, e))| ClusterShard {
                    slot_ranges: vec![(s, e)],
                    nodes: vec![node(&format!("n{i}"), true)],
                })
                .collect(),
        }
    }

    #[test]
    fn validate_accepts_exact_partition() {
        let t = topology(&[(0, 99), (100, 199)], 200);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn validate_rejects_gap() {
        let t = topology(&[(0, 98), (100, 199)], 200);
        assert!(t.validate().is_err());
    }

    #[test]
    fn validate_rejects_overlap() {
        let t = topology(&[(0, 100), (100, 199)], 200);
        assert!(t.validate().is_err());
    }

    #[test]
    fn shard_for_slot_finds_owner() {
        let t = topology(&[(0, 99), (100, 199), (200, 299)], 300);
        assert!(t.shard_for_slot(150).unwrap().contains_slot(150));
        assert!(t.shard_for_slot(0).unwrap().contains_slot(0));
        assert!(t.shard_for_slot(299).unwrap().contains_slot(299));
    }

    #[test]
    fn every_slot_owned_by_exactly_one_shard() {
        let t = topology(&[(0, 49), (50, 99)], 100);
        for slot in 0..100u16 {
            let owners: Vec<_> = t.shards.iter().filter(|s| s.contains_slot(slot)).collect();
            assert_eq!(owners.len(), 1, "slot {slot} should have exactly one owner");
        }
    }

    #[test]
    fn topology_handle_swap_is_atomic_and_old_snapshot_still_valid() {
        let handle = TopologyHandle::new(topology(&[(0, 99)], 100));
        let old = handle.snapshot();
        handle.swap(topology(&[(0, 199)], 200));
        assert_eq!(old.num_slots, 100);
        assert_eq!(handle.snapshot().num_slots, 200);
    }

    #[test]
    fn clone_is_deep_equal_but_pointer_disjoint() {
        let t = topology(&[(0, 99)], 100);
        let cloned = t.clone();
        assert_eq!(t, cloned);
        assert_ne!(&t as *const _, &cloned as *const _);
    }
}
