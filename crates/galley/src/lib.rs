//! Galley: a graph-based kitchen simulation with deterministic replay.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Galley sub-crates. For most users, adding `galley` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use galley::prelude::*;
//!
//! let config = KitchenConfig::from_toml_str(r#"
//!     [graph]
//!     nodes = [
//!         { id = 0, kind = "floor", name = "Floor" },
//!         { id = 1, kind = "source", name = "Bin", item_id = 1 },
//!         { id = 2, kind = "process", name = "Stove" },
//!         { id = 3, kind = "delivery", name = "Window" },
//!     ]
//!     edges = [[0, 1, 2], [0, 2, 3], [2, 3, 1]]
//!
//!     [[recipes]]
//!     input = 1
//!     station = "Stove"
//!     output = 2
//!     duration = 5
//! "#).unwrap();
//!
//! let mut env = KitchenEnv::new(&config).unwrap();
//! let start = env.reset();
//! assert_eq!(start.orders.len(), 1);
//!
//! let result = env.step(Action::Move(NodeId(1)));
//! assert_eq!(result.time_elapsed, 2);
//! let result = env.step(Action::Interact);
//! assert_eq!(result.outcome.code(), "Pickup_1");
//! assert_eq!(result.snapshot.tick, 3);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `galley-core` | IDs, items, orders, stations, outcome codes, snapshots |
//! | [`nav`] | `galley-nav` | Navigation graph and shortest paths |
//! | [`engine`] | `galley-engine` | Config loading, interaction rules, world, episode driver |
//! | [`replay`] | `galley-replay` | Episode recording, loading and verification |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`galley-core`).
pub use galley_core as types;

/// Navigation graph (`galley-nav`).
///
/// [`nav::NavigationGraph`] memoises all-pairs shortest paths at
/// construction and answers distance and move-cost queries.
pub use galley_nav as nav;

/// Simulation engine (`galley-engine`).
///
/// [`engine::KitchenConfig`] loads and validates a kitchen,
/// [`engine::WorldState`] owns the simulation and [`engine::KitchenEnv`]
/// drives it one discrete action at a time.
pub use galley_engine as engine;

/// Recording and replay (`galley-replay`).
///
/// Wrap an env in [`replay::RecordingEnv`] to record episodes, read them
/// back with [`replay::ReplayLoader`] and verify them with
/// [`replay::replay_and_compare`].
pub use galley_replay as replay;

/// Common imports for typical Galley usage.
///
/// ```rust
/// use galley::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use galley_core::{
        InteractionOutcome, Item, ItemTypeId, NodeId, Order, StateSnapshot, Station, StationKind,
    };

    // Navigation
    pub use galley_nav::NavigationGraph;

    // Engine
    pub use galley_engine::{
        Action, ConfigError, KitchenConfig, KitchenEnv, StepOutcome, StepResult, WorldState,
    };

    // Replay
    pub use galley_replay::{
        DirectorySink, RecordingEnv, RecordingOptions, ReplayError, ReplayLoader, ReplayTimeline,
    };
}
