//! Core types for the Galley kitchen simulation.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental vocabulary shared by the navigation graph, the engine
//! and the replay subsystem: typed identifiers, the world entities
//! (items, orders, stations), interaction outcome codes, and the
//! [`StateSnapshot`] surface that recorders read from a running world.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod item;
pub mod order;
pub mod outcome;
pub mod snapshot;
pub mod station;

pub use error::ParseOutcomeError;
pub use id::{ItemTypeId, ItemUid, NodeId, OrderId};
pub use item::Item;
pub use order::Order;
pub use outcome::{InteractionOutcome, MoveOutcome};
pub use snapshot::StateSnapshot;
pub use station::{Station, StationKind, StationPhase};
