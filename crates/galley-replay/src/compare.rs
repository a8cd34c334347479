//! Snapshot comparison and replay verification.
//!
//! Comparison is hash-first (fast path) with a per-component fallback on
//! mismatch, plus a driver that re-runs a recorded episode's actions
//! through a live environment and checks every keyframe.

use galley_core::{Item, NodeId, Order, StateSnapshot, Station};
use galley_engine::KitchenEnv;
use rand::RngCore;

use crate::hash::snapshot_hash;
use crate::reader::LoadedReplay;
use crate::types::ReplayEvent;

/// One component that differs between recorded and live state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Divergence {
    /// Clock values differ.
    Tick {
        /// Recorded value.
        recorded: u64,
        /// Live value.
        live: u64,
    },
    /// Agent positions differ.
    AgentNode {
        /// Recorded value.
        recorded: NodeId,
        /// Live value.
        live: NodeId,
    },
    /// Inventories differ.
    Inventory {
        /// Recorded inventory.
        recorded: Vec<Item>,
        /// Live inventory.
        live: Vec<Item>,
    },
    /// One station differs, or exists on only one side.
    Station {
        /// Node id of the station.
        node: NodeId,
        /// Recorded station.
        recorded: Option<Station>,
        /// Live station.
        live: Option<Station>,
    },
    /// Order queues differ.
    Orders {
        /// Recorded orders.
        recorded: Vec<Order>,
        /// Live orders.
        live: Vec<Order>,
    },
    /// Delivery counts differ.
    CompletedOrders {
        /// Recorded value.
        recorded: u32,
        /// Live value.
        live: u32,
    },
}

/// Report of everything that differs at one keyframe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivergenceReport {
    /// Tick of the recorded keyframe.
    pub tick: u64,
    /// Hash of the recorded snapshot.
    pub recorded_hash: u64,
    /// Hash of the live snapshot.
    pub live_hash: u64,
    /// Component-level differences.
    pub divergences: Vec<Divergence>,
}

/// Compare a live snapshot against a recorded one.
///
/// Returns `None` if they hash equal; otherwise a report listing each
/// differing component.
pub fn compare_snapshot(
    recorded: &StateSnapshot,
    live: &StateSnapshot,
) -> Option<DivergenceReport> {
    let recorded_hash = snapshot_hash(recorded);
    let live_hash = snapshot_hash(live);
    if recorded_hash == live_hash {
        return None;
    }

    let mut divergences = Vec::new();
    if recorded.tick != live.tick {
        divergences.push(Divergence::Tick {
            recorded: recorded.tick,
            live: live.tick,
        });
    }
    if recorded.agent_node != live.agent_node {
        divergences.push(Divergence::AgentNode {
            recorded: recorded.agent_node,
            live: live.agent_node,
        });
    }
    if recorded.inventory != live.inventory {
        divergences.push(Divergence::Inventory {
            recorded: recorded.inventory.clone(),
            live: live.inventory.clone(),
        });
    }
    let mut nodes: Vec<NodeId> = recorded
        .stations
        .keys()
        .chain(live.stations.keys())
        .copied()
        .collect();
    nodes.sort_unstable();
    nodes.dedup();
    for node in nodes {
        let r = recorded.stations.get(&node);
        let l = live.stations.get(&node);
        if r != l {
            divergences.push(Divergence::Station {
                node,
                recorded: r.cloned(),
                live: l.cloned(),
            });
        }
    }
    if recorded.orders != live.orders {
        divergences.push(Divergence::Orders {
            recorded: recorded.orders.clone(),
            live: live.orders.clone(),
        });
    }
    if recorded.completed_orders != live.completed_orders {
        divergences.push(Divergence::CompletedOrders {
            recorded: recorded.completed_orders,
            live: live.completed_orders,
        });
    }

    Some(DivergenceReport {
        tick: recorded.tick,
        recorded_hash,
        live_hash,
        divergences,
    })
}

/// Re-run a recorded episode and check every keyframe.
///
/// Resets `env`, then walks the events in order: each ACTION is applied
/// with [`KitchenEnv::step`] and each STATE is compared against the live
/// world. `env` must be built from the same config and have its order
/// RNG in the same state it had when the episode was recorded (for a
/// freshly seeded env, the first episode it ran).
///
/// Returns the first divergence found, or `None` if every keyframe
/// matches.
pub fn replay_and_compare<R: RngCore>(
    replay: &LoadedReplay,
    env: &mut KitchenEnv<R>,
) -> Option<DivergenceReport> {
    env.reset();
    for event in &replay.events {
        match event {
            ReplayEvent::Action(record) => {
                env.step(record.to_action());
            }
            ReplayEvent::State { snapshot, .. } => {
                let live = env.world().snapshot();
                if let Some(report) = compare_snapshot(snapshot, &live) {
                    tracing::warn!(
                        tick = report.tick,
                        divergences = report.divergences.len(),
                        "replay diverged"
                    );
                    return Some(report);
                }
            }
        }
    }
    None
}
