//! Hashing utilities for snapshot comparison.
//!
//! Uses FNV-1a for fast, deterministic hashing of world state. These
//! hashes are not cryptographically secure; they are used for fast
//! equality checks during replay verification.

use galley_core::{Item, StateSnapshot, Station, StationKind};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[derive(Clone, Copy)]
struct Fnv(u64);

impl Fnv {
    #[inline]
    fn byte(self, byte: u8) -> Self {
        Self((self.0 ^ byte as u64).wrapping_mul(FNV_PRIME))
    }

    #[inline]
    fn bytes(mut self, bytes: &[u8]) -> Self {
        for &b in bytes {
            self = self.byte(b);
        }
        self
    }

    #[inline]
    fn u32(self, v: u32) -> Self {
        self.bytes(&v.to_le_bytes())
    }

    #[inline]
    fn u64(self, v: u64) -> Self {
        self.bytes(&v.to_le_bytes())
    }

    /// Length-prefixed so adjacent strings cannot run together.
    fn str(self, s: &str) -> Self {
        self.u64(s.len() as u64).bytes(s.as_bytes())
    }

    fn opt_u32(self, v: Option<u32>) -> Self {
        match v {
            Some(v) => self.byte(1).u32(v),
            None => self.byte(0),
        }
    }

    fn item(self, item: &Item) -> Self {
        self.u32(item.type_id.0).u64(item.uid.0).u64(item.created_at)
    }

    fn station(self, s: &Station) -> Self {
        let kind = match s.kind {
            StationKind::Floor => 0,
            StationKind::Source => 1,
            StationKind::Process => 2,
            StationKind::Delivery => 3,
        };
        let h = self
            .u32(s.node_id.0)
            .str(&s.name)
            .byte(kind)
            .opt_u32(s.source_item.map(|t| t.0));
        let h = match &s.held_item {
            Some(item) => h.byte(1).item(item),
            None => h.byte(0),
        };
        h.byte(s.is_busy as u8)
            .u32(s.timer)
            .opt_u32(s.output_item_type.map(|t| t.0))
    }
}

/// Hash everything observable in a snapshot.
///
/// Inventory, station and order order all matter: two snapshots hash
/// equal only if their contents are identical in storage order.
pub fn snapshot_hash(snapshot: &StateSnapshot) -> u64 {
    let mut h = Fnv(FNV_OFFSET)
        .u64(snapshot.tick)
        .u32(snapshot.agent_node.0)
        .u32(snapshot.completed_orders);

    h = h.u64(snapshot.inventory.len() as u64);
    for item in &snapshot.inventory {
        h = h.item(item);
    }

    h = h.u64(snapshot.stations.len() as u64);
    for (node, station) in &snapshot.stations {
        h = h.u32(node.0).station(station);
    }

    h = h.u64(snapshot.orders.len() as u64);
    for order in &snapshot.orders {
        h = h
            .u64(order.order_id.0)
            .u32(order.item_type.0)
            .u64(order.time_remaining as u64)
            .u32(order.max_time);
    }

    h.0
}
