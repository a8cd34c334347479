//! Replay log records.
//!
//! A log is newline-delimited JSON: one [`MetadataRecord`] line, then
//! any number of [`ReplayEvent`] lines.
//!
//! ```text
//! {"metadata": {"version": "1.0", "episode_id": "…", …}}
//! {"tick": 0, "type": "STATE", "snapshot": {…}}
//! {"tick": 0, "type": "ACTION", "action": "MOVE", "from": 0, "target": 1, "duration": 2, "result": "Move_0_to_1"}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use galley_core::{InteractionOutcome, ItemTypeId, NodeId, StateSnapshot, StationKind};
use galley_engine::{Action, KitchenConfig};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReplayError;

/// Log format version written into every metadata record.
pub const FORMAT_VERSION: &str = "1.0";

// ── Metadata ──────────────────────────────────────────────────────

/// Static description of one station, for renderers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    /// Station kind.
    #[serde(rename = "type")]
    pub kind: StationKind,
    /// Display name.
    pub name: String,
    /// Item dispensed, for Source stations.
    pub item_id: Option<ItemTypeId>,
}

/// Station layout keyed by node id.
pub type MapLayout = BTreeMap<NodeId, MapEntry>;

/// Extract the station layout from a config.
pub fn map_layout(config: &KitchenConfig) -> MapLayout {
    config
        .graph
        .nodes
        .iter()
        .map(|n| {
            (
                n.id,
                MapEntry {
                    kind: n.kind,
                    name: n.name.clone(),
                    item_id: n.item_id,
                },
            )
        })
        .collect()
}

/// Per-episode header. Totals are zero on disk and filled in when the
/// recorder finalizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayMetadata {
    /// Log format version.
    pub version: String,
    /// Unique id for this episode.
    pub episode_id: Uuid,
    /// Where the kitchen config came from, if known.
    #[serde(default)]
    pub config_path: String,
    /// Wall-clock time the recording started.
    pub start_time: DateTime<Utc>,
    /// Clock value at the end of the episode.
    #[serde(default)]
    pub total_ticks: u64,
    /// Orders delivered.
    #[serde(default)]
    pub completed_orders: u32,
    /// Orders that expired.
    #[serde(default)]
    pub expired_orders: u32,
    /// ACTION events written.
    #[serde(default)]
    pub actions_recorded: u64,
    /// Station layout.
    #[serde(default)]
    pub map_layout: MapLayout,
}

impl ReplayMetadata {
    /// Fresh metadata with a random episode id and the current time.
    pub fn new(config_path: impl Into<String>, map_layout: MapLayout) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            episode_id: Uuid::new_v4(),
            config_path: config_path.into(),
            start_time: Utc::now(),
            total_ticks: 0,
            completed_orders: 0,
            expired_orders: 0,
            actions_recorded: 0,
            map_layout,
        }
    }
}

/// The first line of a log: `{"metadata": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataRecord {
    /// The wrapped metadata.
    pub metadata: ReplayMetadata,
}

// ── Events ────────────────────────────────────────────────────────

/// Kind of agent action recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    /// A move to `target`.
    Move,
    /// An interaction at `target`.
    Interact,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Move => "MOVE",
            Self::Interact => "INTERACT",
        })
    }
}

/// One recorded agent action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionRecord {
    /// Tick at which the action began.
    pub tick: u64,
    /// Move or interact.
    pub action: ActionKind,
    /// Agent node before the action.
    pub from: NodeId,
    /// Move destination, or the station interacted with.
    pub target: NodeId,
    /// Ticks the action took.
    pub duration: u32,
    /// Stable outcome code.
    pub result: String,
}

impl ActionRecord {
    /// The engine action that reproduces this record.
    pub fn to_action(&self) -> Action {
        match self.action {
            ActionKind::Move => Action::Move(self.target),
            ActionKind::Interact => Action::Interact,
        }
    }

    /// The interaction outcome, for INTERACT records with a valid code.
    pub fn interaction_outcome(&self) -> Option<InteractionOutcome> {
        match self.action {
            ActionKind::Interact => self.result.parse().ok(),
            ActionKind::Move => None,
        }
    }
}

/// One event line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventLine", into = "EventLine")]
pub enum ReplayEvent {
    /// A full keyframe.
    State {
        /// Clock value of the snapshot.
        tick: u64,
        /// The world state.
        snapshot: StateSnapshot,
    },
    /// An agent action.
    Action(ActionRecord),
}

impl ReplayEvent {
    /// Tick the event is stamped with.
    pub fn tick(&self) -> u64 {
        match self {
            Self::State { tick, .. } => *tick,
            Self::Action(a) => a.tick,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum EventType {
    #[serde(rename = "STATE")]
    State,
    #[serde(rename = "ACTION")]
    Action,
}

/// Flat wire form of [`ReplayEvent`].
///
/// Deserializing straight from the JSON stream keeps integer-keyed maps
/// in the snapshot (stations by node id) readable, which a buffered
/// tagged-enum representation cannot do.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct EventLine {
    tick: u64,
    #[serde(rename = "type")]
    kind: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snapshot: Option<StateSnapshot>,
}

impl From<ReplayEvent> for EventLine {
    fn from(event: ReplayEvent) -> Self {
        match event {
            ReplayEvent::State { tick, snapshot } => Self {
                tick,
                kind: EventType::State,
                action: None,
                from: None,
                target: None,
                duration: None,
                result: None,
                snapshot: Some(snapshot),
            },
            ReplayEvent::Action(a) => Self {
                tick: a.tick,
                kind: EventType::Action,
                action: Some(a.action),
                from: Some(a.from),
                target: Some(a.target),
                duration: Some(a.duration),
                result: Some(a.result),
                snapshot: None,
            },
        }
    }
}

fn require<T>(field: Option<T>, name: &str, tick: u64) -> Result<T, ReplayError> {
    field.ok_or_else(|| ReplayError::MalformedEvent {
        detail: format!("event at tick {tick} is missing '{name}'"),
    })
}

impl TryFrom<EventLine> for ReplayEvent {
    type Error = ReplayError;

    fn try_from(line: EventLine) -> Result<Self, Self::Error> {
        let tick = line.tick;
        match line.kind {
            EventType::State => Ok(Self::State {
                tick,
                snapshot: require(line.snapshot, "snapshot", tick)?,
            }),
            EventType::Action => Ok(Self::Action(ActionRecord {
                tick,
                action: require(line.action, "action", tick)?,
                from: require(line.from, "from", tick)?,
                target: require(line.target, "target", tick)?,
                duration: require(line.duration, "duration", tick)?,
                result: line.result.unwrap_or_default(),
            })),
        }
    }
}
