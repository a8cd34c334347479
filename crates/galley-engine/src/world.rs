//! The kitchen world: exclusive owner of all mutable simulation state.
//!
//! [`WorldState`] holds the agent position, inventory, stations, orders
//! and clock. Agent actions ([`move_agent`](WorldState::move_agent),
//! [`interact`](WorldState::interact)) and the passage of time
//! ([`tick`](WorldState::tick)) are the only ways state changes. Nothing
//! an agent does is an error: illegal interactions come back as failure
//! outcomes with the world untouched.

use std::sync::Arc;

use galley_core::{
    InteractionOutcome, Item, ItemTypeId, ItemUid, NodeId, Order, OrderId, StateSnapshot, Station,
};
use galley_nav::NavigationGraph;
use indexmap::IndexMap;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{ConfigError, KitchenConfig};
use crate::interaction::{InteractionManager, RecipeBook};

/// Reward placeholder returned for a failed interaction.
pub const FAILED_INTERACTION_REWARD: f32 = -0.1;

/// Single-agent kitchen simulation.
///
/// Generic over the order RNG so tests and trainers can inject their
/// own source; [`WorldState::new`] seeds a [`ChaCha8Rng`] from
/// `simulation.seed`. Given the same RNG state and the same action
/// sequence, two worlds evolve identically.
///
/// # Examples
///
/// ```
/// use galley_core::NodeId;
/// use galley_engine::{KitchenConfig, WorldState};
///
/// let cfg = KitchenConfig::from_toml_str(r#"
///     [graph]
///     nodes = [
///         { id = 0, kind = "floor", name = "Floor" },
///         { id = 1, kind = "source", name = "Bin", item_id = 1 },
///         { id = 2, kind = "process", name = "Stove" },
///     ]
///     edges = [[0, 1, 2], [0, 2, 3]]
///
///     [[recipes]]
///     input = 1
///     station = "Stove"
///     output = 2
///     duration = 5
/// "#).unwrap();
///
/// let mut world = WorldState::new(&cfg).unwrap();
/// assert_eq!(world.orders().len(), 1);
///
/// assert_eq!(world.move_agent(NodeId(1)), 2);
/// let (reward, outcome) = world.interact();
/// assert_eq!(reward, 0.0);
/// assert_eq!(outcome.code(), "Pickup_1");
/// assert_eq!(world.inventory().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct WorldState<R = ChaCha8Rng> {
    config: KitchenConfig,
    graph: Arc<NavigationGraph>,
    manager: InteractionManager,
    order_menu: Vec<ItemTypeId>,
    rng: R,

    agent_node: NodeId,
    inventory: Vec<Item>,
    stations: IndexMap<NodeId, Station>,
    orders: Vec<Order>,
    global_time: u64,
    last_order_id: u64,
    last_item_uid: u64,
    completed_orders: u32,
    expired_orders: u32,
}

impl WorldState<ChaCha8Rng> {
    /// Build a world with a [`ChaCha8Rng`] seeded from `simulation.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config fails validation.
    pub fn new(config: &KitchenConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(config.simulation.seed))
    }
}

impl<R: RngCore> WorldState<R> {
    /// Build a world that draws orders from `rng`.
    ///
    /// Validates the config, builds the graph and one station per node,
    /// then resets to the start of an episode.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config fails validation.
    pub fn with_rng(config: &KitchenConfig, rng: R) -> Result<Self, ConfigError> {
        let graph = Arc::new(config.validate_and_build()?);
        Ok(Self::from_parts(config, graph, rng))
    }

    /// Build a world sharing an already-built graph.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config fails validation.
    ///
    /// # Panics
    ///
    /// Panics if `graph` does not have one node per configured station.
    pub fn with_shared_graph(
        config: &KitchenConfig,
        graph: Arc<NavigationGraph>,
        rng: R,
    ) -> Result<Self, ConfigError> {
        assert_eq!(
            graph.node_count(),
            config.node_count(),
            "shared graph does not match config"
        );
        config.validate_with_graph(&graph)?;
        Ok(Self::from_parts(config, graph, rng))
    }

    fn from_parts(config: &KitchenConfig, graph: Arc<NavigationGraph>, rng: R) -> Self {
        let mut nodes: Vec<_> = config.graph.nodes.iter().collect();
        nodes.sort_by_key(|n| n.id);
        let stations = nodes
            .into_iter()
            .map(|n| (n.id, Station::new(n.id, n.name.clone(), n.kind, n.item_id)))
            .collect();

        let mut world = Self {
            manager: InteractionManager::new(
                RecipeBook::new(&config.recipes),
                config.simulation.max_inventory,
            ),
            order_menu: config.order_menu(),
            config: config.clone(),
            graph,
            rng,
            agent_node: config.simulation.start_node,
            inventory: Vec::new(),
            stations,
            orders: Vec::new(),
            global_time: 0,
            last_order_id: 0,
            last_item_uid: 0,
            completed_orders: 0,
            expired_orders: 0,
        };
        world.reset();
        world
    }

    /// Return to the start of an episode.
    ///
    /// Clock, counters, inventory and orders are cleared, every station
    /// goes idle and empty, the agent returns to the start node, and one
    /// order is spawned. The RNG is not reseeded.
    pub fn reset(&mut self) {
        self.global_time = 0;
        self.agent_node = self.config.simulation.start_node;
        self.inventory.clear();
        self.orders.clear();
        self.last_order_id = 0;
        self.last_item_uid = 0;
        self.completed_orders = 0;
        self.expired_orders = 0;
        for station in self.stations.values_mut() {
            station.reset();
        }
        self.spawn_order();
    }

    // ── Agent actions ─────────────────────────────────────────────

    /// Move the agent to `target` and return the time it took.
    ///
    /// The agent always ends up at `target`. Staying put costs one tick;
    /// otherwise the cost comes from [`NavigationGraph::move_cost`].
    ///
    /// # Panics
    ///
    /// Panics if `target` is not a node in the graph.
    pub fn move_agent(&mut self, target: NodeId) -> u32 {
        let cost = if target == self.agent_node {
            1
        } else {
            self.graph.move_cost(self.agent_node, target)
        };
        self.agent_node = target;
        cost
    }

    /// Interact with the station under the agent.
    ///
    /// Returns a reward placeholder (`0.0` on success,
    /// [`FAILED_INTERACTION_REWARD`] on failure) and the outcome. A
    /// failed interaction leaves the world unchanged.
    pub fn interact(&mut self) -> (f32, InteractionOutcome) {
        let node = self.agent_node;
        let result = self
            .manager
            .attempt(&self.stations[&node], &self.inventory, &self.orders);
        if !result.success {
            return (FAILED_INTERACTION_REWARD, result.outcome);
        }

        match result.outcome {
            InteractionOutcome::Pickup { item_type } => {
                self.last_item_uid += 1;
                self.inventory.push(Item::new(
                    item_type,
                    ItemUid(self.last_item_uid),
                    self.global_time,
                ));
            }
            InteractionOutcome::Retrieve => {
                if let Some(item) = self.stations[&node].take_item() {
                    self.inventory.push(item);
                }
            }
            InteractionOutcome::Place {
                inventory_index,
                output,
                duration,
            } => {
                let item = self.inventory.remove(inventory_index);
                self.stations[&node].begin_processing(item, output, duration);
            }
            InteractionOutcome::Deliver {
                inventory_index,
                order_id,
            } => {
                self.inventory.remove(inventory_index);
                self.orders.retain(|o| o.order_id != order_id);
                self.completed_orders += 1;
                tracing::debug!(order = %order_id, tick = self.global_time, "order delivered");
            }
            _ => {}
        }
        (0.0, result.outcome)
    }

    /// Whether [`interact`](Self::interact) would currently succeed.
    pub fn can_interact(&self) -> bool {
        self.manager
            .attempt(&self.stations[&self.agent_node], &self.inventory, &self.orders)
            .success
    }

    // ── Time ──────────────────────────────────────────────────────

    /// Advance the clock by `seconds` and return how many orders expired.
    ///
    /// Each second: the clock advances, every station ticks, every order
    /// counts down and expired ones are removed, then a new order may
    /// spawn if there is room.
    pub fn tick(&mut self, seconds: u32) -> u32 {
        let mut expired = 0;
        for _ in 0..seconds {
            self.global_time += 1;

            for station in self.stations.values_mut() {
                if station.tick() {
                    tracing::debug!(
                        station = %station.node_id,
                        tick = self.global_time,
                        "processing finished"
                    );
                }
            }

            let now = self.global_time;
            self.orders.retain_mut(|order| {
                order.time_remaining -= 1;
                if order.is_expired() {
                    tracing::debug!(order = %order.order_id, tick = now, "order expired");
                    expired += 1;
                    false
                } else {
                    true
                }
            });

            if self.orders.len() < self.config.simulation.max_orders
                && self
                    .rng
                    .random_bool(self.config.simulation.order_spawn_probability)
            {
                self.spawn_order();
            }
        }
        self.expired_orders += expired;
        expired
    }

    /// Spawn an order for a uniformly chosen menu item.
    ///
    /// Returns `None` without consuming randomness if the order queue is
    /// already full.
    pub fn spawn_order(&mut self) -> Option<OrderId> {
        if self.orders.len() >= self.config.simulation.max_orders {
            return None;
        }
        let item_type = *self.order_menu.choose(&mut self.rng)?;
        self.last_order_id += 1;
        let order_id = OrderId(self.last_order_id);
        self.orders
            .push(Order::new(order_id, item_type, self.config.simulation.order_ttl));
        tracing::debug!(
            order = %order_id,
            item = %item_type,
            tick = self.global_time,
            "order spawned"
        );
        Some(order_id)
    }

    // ── Observation ───────────────────────────────────────────────

    /// Deep copy of everything observable.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            tick: self.global_time,
            agent_node: self.agent_node,
            inventory: self.inventory.clone(),
            stations: self.stations.clone(),
            orders: self.orders.clone(),
            completed_orders: self.completed_orders,
        }
    }

    /// Node the agent stands on.
    pub fn agent_node(&self) -> NodeId {
        self.agent_node
    }

    /// Inventory in pickup order.
    pub fn inventory(&self) -> &[Item] {
        &self.inventory
    }

    /// Active orders in insertion order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// All stations keyed by node id, ascending.
    pub fn stations(&self) -> &IndexMap<NodeId, Station> {
        &self.stations
    }

    /// Look up one station.
    pub fn station(&self, node: NodeId) -> Option<&Station> {
        self.stations.get(&node)
    }

    /// Simulated seconds since reset.
    pub fn global_time(&self) -> u64 {
        self.global_time
    }

    /// Orders delivered since reset.
    pub fn completed_orders(&self) -> u32 {
        self.completed_orders
    }

    /// Orders expired since reset.
    pub fn expired_orders(&self) -> u32 {
        self.expired_orders
    }

    /// The shared navigation graph.
    pub fn graph(&self) -> &Arc<NavigationGraph> {
        &self.graph
    }

    /// The config this world was built from.
    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// The interaction manager.
    pub fn interactions(&self) -> &InteractionManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{kitchen, quiet_kitchen};
    use galley_core::StationPhase;

    const STOVE: NodeId = NodeId(3);
    const POTATO_BIN: NodeId = NodeId(1);
    const WINDOW: NodeId = NodeId(5);

    fn world() -> WorldState {
        WorldState::new(&quiet_kitchen()).unwrap()
    }

    #[test]
    fn reset_state() {
        let w = world();
        assert_eq!(w.global_time(), 0);
        assert_eq!(w.agent_node(), NodeId(0));
        assert!(w.inventory().is_empty());
        assert_eq!(w.orders().len(), 1);
        assert_eq!(w.orders()[0].order_id, OrderId(1));
        assert!(w.stations().values().all(|s| s.phase() == StationPhase::IdleEmpty));
        let keys: Vec<_> = w.stations().keys().copied().collect();
        assert_eq!(keys, (0..6).map(NodeId).collect::<Vec<_>>());
    }

    #[test]
    fn move_costs_and_relocation() {
        let mut w = world();
        assert_eq!(w.move_agent(NodeId(0)), 1);
        assert_eq!(w.move_agent(POTATO_BIN), 2);
        assert_eq!(w.agent_node(), POTATO_BIN);
        // PotatoBin to ServiceWindow is not an edge.
        assert_eq!(w.move_agent(WINDOW), 100);
        assert_eq!(w.agent_node(), WINDOW);
    }

    #[test]
    fn source_pickup_does_not_touch_station() {
        let mut w = world();
        w.move_agent(POTATO_BIN);
        let before = w.station(POTATO_BIN).cloned();
        let (reward, outcome) = w.interact();
        assert_eq!(reward, 0.0);
        assert_eq!(outcome.code(), "Pickup_1");
        assert_eq!(w.station(POTATO_BIN).cloned(), before);
        assert_eq!(w.inventory()[0].uid, ItemUid(1));

        w.interact();
        assert_eq!(w.inventory()[1].uid, ItemUid(2));
        let (reward, outcome) = w.interact();
        assert_eq!(reward, FAILED_INTERACTION_REWARD);
        assert_eq!(outcome, InteractionOutcome::InventoryFull);
        assert_eq!(w.inventory().len(), 2);
    }

    #[test]
    fn process_lifecycle() {
        let mut w = world();
        w.move_agent(POTATO_BIN);
        w.interact();
        w.move_agent(STOVE);
        let (_, outcome) = w.interact();
        assert_eq!(outcome.code(), "Place_0_2_15");
        assert!(w.inventory().is_empty());

        let stove = w.station(STOVE).unwrap();
        assert_eq!(stove.phase(), StationPhase::Busy);
        assert_eq!(stove.timer, 15);
        assert_eq!(stove.held_item.as_ref().unwrap().type_id, ItemTypeId(1));

        w.tick(14);
        assert_eq!(w.station(STOVE).unwrap().phase(), StationPhase::Busy);
        assert_eq!(w.interact().1, InteractionOutcome::StationBusy);

        w.tick(1);
        let stove = w.station(STOVE).unwrap();
        assert_eq!(stove.phase(), StationPhase::IdleHolding);
        assert_eq!(stove.timer, 0);
        assert_eq!(stove.held_item.as_ref().unwrap().type_id, ItemTypeId(2));
        assert_eq!(stove.output_item_type, None);

        assert_eq!(w.interact().1, InteractionOutcome::Retrieve);
        assert_eq!(w.inventory()[0].type_id, ItemTypeId(2));
        assert_eq!(w.station(STOVE).unwrap().phase(), StationPhase::IdleEmpty);
    }

    #[test]
    fn delivery_completes_order_then_fails_cleanly() {
        let mut cfg = quiet_kitchen();
        cfg.simulation.order_menu = vec![ItemTypeId(2)];
        let mut w = WorldState::new(&cfg).unwrap();

        w.move_agent(POTATO_BIN);
        w.interact();
        w.move_agent(STOVE);
        w.interact();
        w.tick(15);
        w.interact();
        w.move_agent(WINDOW);

        let (reward, outcome) = w.interact();
        assert_eq!(reward, 0.0);
        assert_eq!(outcome.code(), "Deliver_0_1");
        assert!(w.orders().is_empty());
        assert!(w.inventory().is_empty());
        assert_eq!(w.completed_orders(), 1);

        let (reward, outcome) = w.interact();
        assert_eq!(reward, FAILED_INTERACTION_REWARD);
        assert_eq!(outcome.code(), "Wrong Item");
        assert_eq!(w.completed_orders(), 1);
    }

    #[test]
    fn order_expires_after_ttl() {
        let mut w = world();
        w.tick(59);
        assert_eq!(w.orders().len(), 1);
        assert_eq!(w.orders()[0].time_remaining, 1);
        assert_eq!(w.tick(1), 1);
        assert!(w.orders().is_empty());
        assert_eq!(w.expired_orders(), 1);
        assert_eq!(w.tick(10), 0);
        assert_eq!(w.expired_orders(), 1);
    }

    #[test]
    fn floor_interaction_fails() {
        let mut w = world();
        let (reward, outcome) = w.interact();
        assert_eq!(reward, FAILED_INTERACTION_REWARD);
        assert_eq!(outcome, InteractionOutcome::NothingToInteract);
        assert!(!w.can_interact());
    }

    #[test]
    fn spawning_respects_capacity() {
        let mut cfg = kitchen();
        cfg.simulation.order_spawn_probability = 1.0;
        let mut w = WorldState::new(&cfg).unwrap();
        w.tick(5);
        assert_eq!(w.orders().len(), cfg.simulation.max_orders);
        assert_eq!(w.spawn_order(), None);
        let ids: Vec<_> = w.orders().iter().map(|o| o.order_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(w
            .orders()
            .iter()
            .all(|o| [ItemTypeId(2), ItemTypeId(4)].contains(&o.item_type)));
    }

    #[test]
    fn same_seed_same_orders() {
        let mut cfg = kitchen();
        cfg.simulation.order_spawn_probability = 0.3;
        let mut a = WorldState::new(&cfg).unwrap();
        let mut b = WorldState::new(&cfg).unwrap();
        for _ in 0..50 {
            a.tick(3);
            b.tick(3);
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn reset_restarts_counters() {
        let mut w = world();
        w.move_agent(POTATO_BIN);
        w.interact();
        w.tick(70);
        w.reset();
        assert_eq!(w.global_time(), 0);
        assert_eq!(w.expired_orders(), 0);
        assert!(w.inventory().is_empty());
        assert_eq!(w.orders()[0].order_id, OrderId(1));

        w.interact();
        w.move_agent(POTATO_BIN);
        w.interact();
        assert_eq!(w.inventory()[0].uid, ItemUid(1));
    }

    #[test]
    fn snapshot_is_detached() {
        let mut w = world();
        let snap = w.snapshot();
        w.move_agent(POTATO_BIN);
        w.interact();
        w.tick(3);
        assert_eq!(snap.tick, 0);
        assert!(snap.inventory.is_empty());
        assert_eq!(snap.agent_node, NodeId(0));
    }
}
