//! Stations and the process-station transform timer.
//!
//! A station is one of three phases at any time, encoded jointly by
//! `held_item` and `is_busy`:
//!
//! | `held_item` | `is_busy` | Phase |
//! |-------------|-----------|-------|
//! | `None`      | `false`   | [`StationPhase::IdleEmpty`] |
//! | `Some`      | `true`    | [`StationPhase::Busy`] |
//! | `Some`      | `false`   | [`StationPhase::IdleHolding`] |
//!
//! `Busy -> IdleHolding` happens only through [`Station::tick`], never
//! through an agent action.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{ItemTypeId, NodeId};
use crate::item::Item;

/// Behavioural kind of a station. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    /// Walkable node with nothing to interact with.
    Floor,
    /// Dispenses raw ingredients of one type.
    Source,
    /// Transforms one item according to a recipe over several ticks.
    Process,
    /// Accepts finished items against active orders.
    Delivery,
}

impl StationKind {
    /// Stable lowercase name, as used in configuration and replay logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Source => "source",
            Self::Process => "process",
            Self::Delivery => "delivery",
        }
    }
}

impl fmt::Display for StationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived phase of a station's state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StationPhase {
    /// Nothing held.
    IdleEmpty,
    /// Holding an item that is still being processed.
    Busy,
    /// Holding a finished item, ready for pickup.
    IdleHolding,
}

/// A fixed simulation node with mutable processing state.
///
/// Created once per graph node when the world is built. Only the mutable
/// fields (`held_item`, `is_busy`, `timer`, `output_item_type`) change,
/// and [`reset`](Station::reset) clears them between episodes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Station {
    /// Node this station occupies.
    pub node_id: NodeId,
    /// Display name. Process recipes are keyed by this name.
    pub name: String,
    /// Behavioural kind.
    pub kind: StationKind,
    /// Item type dispensed by a Source station.
    #[serde(default)]
    pub source_item: Option<ItemTypeId>,
    /// Item currently held (being processed or finished).
    #[serde(default)]
    pub held_item: Option<Item>,
    /// Whether a transform is in progress.
    #[serde(default)]
    pub is_busy: bool,
    /// Remaining processing ticks.
    #[serde(default)]
    pub timer: u32,
    /// Type the held item becomes when the timer runs out.
    #[serde(default)]
    pub output_item_type: Option<ItemTypeId>,
}

impl Station {
    /// Create an idle, empty station.
    pub fn new(
        node_id: NodeId,
        name: impl Into<String>,
        kind: StationKind,
        source_item: Option<ItemTypeId>,
    ) -> Self {
        Self {
            node_id,
            name: name.into(),
            kind,
            source_item,
            held_item: None,
            is_busy: false,
            timer: 0,
            output_item_type: None,
        }
    }

    /// Current phase derived from `held_item` and `is_busy`.
    pub fn phase(&self) -> StationPhase {
        match (&self.held_item, self.is_busy) {
            (None, _) => StationPhase::IdleEmpty,
            (Some(_), true) => StationPhase::Busy,
            (Some(_), false) => StationPhase::IdleHolding,
        }
    }

    /// Start transforming `item` into `output` over `duration` ticks.
    ///
    /// A zero duration is rejected at configuration load, so the station
    /// is always left busy with a positive timer.
    pub fn begin_processing(&mut self, item: Item, output: ItemTypeId, duration: u32) {
        debug_assert!(duration > 0, "recipe durations are validated positive");
        self.held_item = Some(item);
        self.output_item_type = Some(output);
        self.timer = duration;
        self.is_busy = true;
    }

    /// Take the held item, leaving the station idle and empty.
    pub fn take_item(&mut self) -> Option<Item> {
        self.is_busy = false;
        self.timer = 0;
        self.output_item_type = None;
        self.held_item.take()
    }

    /// Advance the processing timer by one tick.
    ///
    /// Returns `true` if processing finished on this tick, in which case
    /// the held item has been rewritten to the pending output type.
    pub fn tick(&mut self) -> bool {
        if !self.is_busy {
            return false;
        }
        let Some(item) = self.held_item.as_mut() else {
            self.is_busy = false;
            self.timer = 0;
            return false;
        };
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return false;
        }
        self.is_busy = false;
        if let Some(output) = self.output_item_type.take() {
            item.type_id = output;
        }
        true
    }

    /// Clear all mutable state.
    pub fn reset(&mut self) {
        self.held_item = None;
        self.is_busy = false;
        self.timer = 0;
        self.output_item_type = None;
    }
}
