//! Episode driver: discrete actions in, step results out.
//!
//! [`KitchenEnv`] wraps a [`WorldState`] behind the discrete action space
//! a trainer sees. With `N` stations, action ids `0..N` move to the node
//! with that id and id `N` interacts. Every step takes `&mut self`, so a
//! step can never be re-entered.

use std::collections::BTreeSet;
use std::fmt;

use galley_core::{InteractionOutcome, MoveOutcome, NodeId, StateSnapshot};
use rand::RngCore;
use rand_chacha::ChaCha8Rng;

use crate::config::{ConfigError, KitchenConfig};
use crate::world::WorldState;

/// Ticks consumed by an interact action.
pub const INTERACT_DURATION: u32 = 1;

// ── Actions ───────────────────────────────────────────────────────

/// One agent action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Walk to a node.
    Move(NodeId),
    /// Interact with the station under the agent.
    Interact,
}

impl Action {
    /// Decode an action id for a kitchen with `node_count` stations.
    ///
    /// Returns `None` for ids above `node_count`.
    pub fn from_index(index: usize, node_count: usize) -> Option<Self> {
        match index {
            i if i < node_count => Some(Self::Move(NodeId(i as u32))),
            i if i == node_count => Some(Self::Interact),
            _ => None,
        }
    }

    /// Encode this action as an id for a kitchen with `node_count` stations.
    pub fn index(self, node_count: usize) -> usize {
        match self {
            Self::Move(node) => node.index(),
            Self::Interact => node_count,
        }
    }
}

/// Size of the action space for a kitchen with `node_count` stations.
pub fn action_count(node_count: usize) -> usize {
    node_count + 1
}

// ── Step results ──────────────────────────────────────────────────

/// What an action did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The agent moved.
    Moved(MoveOutcome),
    /// The agent interacted.
    Interacted(InteractionOutcome),
}

impl StepOutcome {
    /// The stable code string.
    pub fn code(&self) -> String {
        self.to_string()
    }

    /// Whether the interaction succeeded. Moves always succeed.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Moved(_) => true,
            Self::Interacted(o) => o.is_success(),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moved(m) => fmt::Display::fmt(m, f),
            Self::Interacted(o) => fmt::Display::fmt(o, f),
        }
    }
}

/// Result of one [`KitchenEnv::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// World state after the action and the elapsed time.
    pub snapshot: StateSnapshot,
    /// Ticks the action took.
    pub time_elapsed: u32,
    /// What the action did.
    pub outcome: StepOutcome,
    /// Interaction reward placeholder; `0.0` for moves.
    pub reward_delta: f32,
    /// Orders that expired while time advanced.
    pub expired_orders: u32,
    /// The delivery target was reached.
    pub terminated: bool,
    /// The clock reached `max_steps`.
    pub truncated: bool,
}

impl StepResult {
    /// Whether the episode is over for either reason.
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

// ── KitchenEnv ────────────────────────────────────────────────────

/// Lockstep episode driver over a [`WorldState`].
#[derive(Clone, Debug)]
pub struct KitchenEnv<R = ChaCha8Rng> {
    world: WorldState<R>,
}

impl KitchenEnv<ChaCha8Rng> {
    /// Build an environment seeded from `simulation.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config fails validation.
    pub fn new(config: &KitchenConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            world: WorldState::new(config)?,
        })
    }
}

impl<R: RngCore> KitchenEnv<R> {
    /// Build an environment drawing orders from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config fails validation.
    pub fn with_rng(config: &KitchenConfig, rng: R) -> Result<Self, ConfigError> {
        Ok(Self {
            world: WorldState::with_rng(config, rng)?,
        })
    }

    /// Wrap an existing world.
    pub fn from_world(world: WorldState<R>) -> Self {
        Self { world }
    }

    /// Start a new episode and return the initial state.
    pub fn reset(&mut self) -> StateSnapshot {
        self.world.reset();
        self.world.snapshot()
    }

    /// Apply one action, then advance time by however long it took.
    ///
    /// # Panics
    ///
    /// Panics if a move targets a node outside the graph.
    pub fn step(&mut self, action: Action) -> StepResult {
        let (outcome, reward_delta, time_elapsed) = match action {
            Action::Move(target) => {
                let from = self.world.agent_node();
                let cost = self.world.move_agent(target);
                (StepOutcome::Moved(MoveOutcome { from, to: target }), 0.0, cost)
            }
            Action::Interact => {
                let (reward, outcome) = self.world.interact();
                (StepOutcome::Interacted(outcome), reward, INTERACT_DURATION)
            }
        };
        let expired_orders = self.world.tick(time_elapsed);

        let sim = &self.world.config().simulation;
        let terminated = sim
            .target_deliveries
            .is_some_and(|target| self.world.completed_orders() >= target);
        let truncated = self.world.global_time() >= sim.max_steps;

        StepResult {
            snapshot: self.world.snapshot(),
            time_elapsed,
            outcome,
            reward_delta,
            expired_orders,
            terminated,
            truncated,
        }
    }

    /// Action ids that make sense right now.
    ///
    /// Every graph neighbour of the agent, plus interact if it would
    /// succeed. Pure: calling it never changes the world.
    pub fn valid_actions(&self) -> BTreeSet<usize> {
        let n = self.node_count();
        let mut valid: BTreeSet<usize> = self
            .world
            .graph()
            .neighbors(self.world.agent_node())
            .iter()
            .map(|node| node.index())
            .collect();
        if self.world.can_interact() {
            valid.insert(Action::Interact.index(n));
        }
        valid
    }

    /// [`valid_actions`](Self::valid_actions) as a dense boolean mask.
    pub fn action_mask(&self) -> Vec<bool> {
        let valid = self.valid_actions();
        (0..self.action_count()).map(|i| valid.contains(&i)).collect()
    }

    /// Number of stations.
    pub fn node_count(&self) -> usize {
        self.world.graph().node_count()
    }

    /// Size of the action space.
    pub fn action_count(&self) -> usize {
        action_count(self.node_count())
    }

    /// The underlying world.
    pub fn world(&self) -> &WorldState<R> {
        &self.world
    }

    /// The config the world was built from.
    pub fn config(&self) -> &KitchenConfig {
        self.world.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::quiet_kitchen;
    use proptest::prelude::*;

    fn env() -> KitchenEnv {
        KitchenEnv::new(&quiet_kitchen()).unwrap()
    }

    #[test]
    fn action_ids_round_trip() {
        assert_eq!(Action::from_index(3, 6), Some(Action::Move(NodeId(3))));
        assert_eq!(Action::from_index(6, 6), Some(Action::Interact));
        assert_eq!(Action::from_index(7, 6), None);
        assert_eq!(Action::Interact.index(6), 6);
        assert_eq!(Action::Move(NodeId(2)).index(6), 2);
        assert_eq!(action_count(6), 7);
    }

    #[test]
    fn move_step_reports_cost_and_code() {
        let mut e = env();
        let r = e.step(Action::Move(NodeId(3)));
        assert_eq!(r.time_elapsed, 5);
        assert_eq!(r.outcome.code(), "Move_0_to_3");
        assert_eq!(r.reward_delta, 0.0);
        assert_eq!(r.snapshot.tick, 5);
        assert_eq!(r.snapshot.agent_node, NodeId(3));
    }

    #[test]
    fn interact_takes_one_tick() {
        let mut e = env();
        e.step(Action::Move(NodeId(1)));
        let r = e.step(Action::Interact);
        assert_eq!(r.time_elapsed, INTERACT_DURATION);
        assert_eq!(r.outcome.code(), "Pickup_1");
        assert_eq!(r.snapshot.tick, 3);
    }

    #[test]
    fn empty_inventory_at_process_station() {
        let mut e = env();
        e.step(Action::Move(NodeId(3)));
        assert!(!e.valid_actions().contains(&6));
        let r = e.step(Action::Interact);
        assert!(!r.outcome.is_success());
        assert_eq!(r.outcome.code(), "No Valid Recipe Item");
        assert_eq!(r.reward_delta, -0.1);
        assert!(r.snapshot.inventory.is_empty());
    }

    #[test]
    fn valid_actions_from_start() {
        let e = env();
        let valid: Vec<_> = e.valid_actions().into_iter().collect();
        assert_eq!(valid, vec![1, 2, 3, 4]);
        assert_eq!(
            e.action_mask(),
            vec![false, true, true, true, true, false, false]
        );
    }

    #[test]
    fn truncates_at_max_steps() {
        let mut cfg = quiet_kitchen();
        cfg.simulation.max_steps = 10;
        let mut e = KitchenEnv::new(&cfg).unwrap();
        let r = e.step(Action::Move(NodeId(3)));
        assert!(!r.truncated);
        let r = e.step(Action::Move(NodeId(0)));
        assert!(r.truncated);
        assert!(!r.terminated);
        assert!(r.is_done());
    }

    #[test]
    fn terminates_on_delivery_target() {
        let mut cfg = quiet_kitchen();
        cfg.simulation.order_menu = vec![galley_core::ItemTypeId(4)];
        cfg.simulation.target_deliveries = Some(1);
        let mut e = KitchenEnv::new(&cfg).unwrap();
        for a in [
            Action::Move(NodeId(2)),
            Action::Interact,
            Action::Move(NodeId(4)),
            Action::Interact,
        ] {
            assert!(!e.step(a).terminated);
        }
        // Wait out the 8-tick slice by walking around the window.
        for node in [5, 3, 5, 4] {
            e.step(Action::Move(NodeId(node)));
        }
        assert_eq!(e.step(Action::Interact).outcome.code(), "Retrieve_Processed");
        e.step(Action::Move(NodeId(5)));
        let r = e.step(Action::Interact);
        assert_eq!(r.outcome.code(), "Deliver_0_1");
        assert!(r.terminated);
    }

    proptest! {
        #[test]
        fn valid_actions_is_pure(actions in prop::collection::vec(0usize..7, 0..40)) {
            let mut e = env();
            for a in actions {
                if let Some(action) = Action::from_index(a, e.node_count()) {
                    e.step(action);
                }
                let before = e.world().snapshot();
                let first = e.valid_actions();
                let second = e.valid_actions();
                prop_assert_eq!(&first, &second);
                prop_assert_eq!(before, e.world().snapshot());
                let interact = Action::Interact.index(e.node_count());
                prop_assert_eq!(first.contains(&interact), e.world().can_interact());
            }
        }

        #[test]
        fn time_always_advances(actions in prop::collection::vec(0usize..7, 1..40)) {
            let mut e = env();
            for a in actions {
                let Some(action) = Action::from_index(a, e.node_count()) else { continue };
                let before = e.world().global_time();
                let r = e.step(action);
                prop_assert!(r.time_elapsed > 0);
                prop_assert_eq!(r.snapshot.tick, before + u64::from(r.time_elapsed));
            }
        }
    }
}
