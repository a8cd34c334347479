//! Kitchen simulation engine for Galley.
//!
//! This crate turns a [`KitchenConfig`] into a running simulation:
//!
//! - [`config`]: TOML/JSON loading and startup validation.
//! - [`interaction`]: the closed table of per-station interaction rules.
//! - [`world`]: [`WorldState`], the exclusive owner of all mutable state.
//! - [`env`]: [`KitchenEnv`], the discrete-action episode driver.
//!
//! The engine is single-threaded and deterministic given its action
//! sequence and order RNG. It has no notion of policies or reward
//! shaping; trainers build those on top of [`StepResult`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod env;
pub mod interaction;
pub mod world;

#[cfg(test)]
pub(crate) mod fixtures;

pub use config::{ConfigError, EdgeDef, GraphDef, KitchenConfig, NodeDef, RecipeDef, SimConstants};
pub use env::{action_count, Action, KitchenEnv, StepOutcome, StepResult, INTERACT_DURATION};
pub use interaction::{InteractionContext, InteractionManager, InteractionResult, RecipeBook};
pub use world::{WorldState, FAILED_INTERACTION_REWARD};
