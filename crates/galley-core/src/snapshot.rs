//! Self-contained copies of a world's observable state.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::item::Item;
use crate::order::Order;
use crate::station::Station;

/// A deep copy of everything observable about a world at one tick.
///
/// Snapshots share nothing with the world they were taken from, so they
/// can be persisted, compared, or handed to a renderer while the world
/// keeps stepping. Stations are keyed by node id in ascending order.
///
/// # Examples
///
/// ```
/// use galley_core::{NodeId, StateSnapshot};
///
/// let snap = StateSnapshot::empty(0, NodeId(0));
/// assert!(snap.inventory.is_empty());
/// assert_eq!(snap.completed_orders, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Global clock at the time of the snapshot.
    pub tick: u64,
    /// Node the agent stands on.
    pub agent_node: NodeId,
    /// Inventory in pickup order.
    pub inventory: Vec<Item>,
    /// Every station, keyed by node id.
    pub stations: IndexMap<NodeId, Station>,
    /// Active orders in insertion order.
    pub orders: Vec<Order>,
    /// Orders delivered so far this episode.
    #[serde(default)]
    pub completed_orders: u32,
}

impl StateSnapshot {
    /// A snapshot with no inventory, stations or orders.
    pub fn empty(tick: u64, agent_node: NodeId) -> Self {
        Self {
            tick,
            agent_node,
            inventory: Vec::new(),
            stations: IndexMap::new(),
            orders: Vec::new(),
            completed_orders: 0,
        }
    }

    /// Look up a station by node id.
    pub fn station(&self, node: NodeId) -> Option<&Station> {
        self.stations.get(&node)
    }
}
