//! Configs shared by this crate's unit tests.

use crate::config::KitchenConfig;

/// The reference kitchen shipped in `configs/kitchen.toml`.
pub fn kitchen() -> KitchenConfig {
    KitchenConfig::from_toml_str(include_str!("../../../configs/kitchen.toml"))
        .expect("reference kitchen parses")
}

/// The reference kitchen with random order spawning switched off.
pub fn quiet_kitchen() -> KitchenConfig {
    let mut cfg = kitchen();
    cfg.simulation.order_spawn_probability = 0.0;
    cfg
}
