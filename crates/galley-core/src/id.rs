//! Strongly-typed identifiers.
//!
//! All ids serialize transparently as their inner integer so the replay
//! log stays readable (`"agent_node": 3`, map keys `"3"`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a station node in the navigation graph.
///
/// Node ids are dense: a kitchen with `n` stations uses `NodeId(0)`
/// through `NodeId(n - 1)`, which lets action indices map directly onto
/// move targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The id as a `usize` index into per-node tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an ingredient or dish type (raw potato, sliced tomato, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemTypeId(pub u32);

impl fmt::Display for ItemTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ItemTypeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an order. Assigned monotonically per world, starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Unique identity of one physical item within an episode.
///
/// Allocated from the owning world's counter, never reused until the
/// world is reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemUid(pub u64);

impl fmt::Display for ItemUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemUid {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
