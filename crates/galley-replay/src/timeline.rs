//! Keyframe index for seeking through a loaded replay.

use galley_core::StateSnapshot;

use crate::reader::LoadedReplay;
use crate::types::{ActionRecord, ReplayEvent, ReplayMetadata};

#[derive(Clone, Debug)]
struct Keyframe {
    snapshot: StateSnapshot,
    /// Number of ACTION events that precede this keyframe.
    action_index: usize,
}

/// Result of [`ReplayTimeline::seek`].
#[derive(Clone, Copy, Debug)]
pub struct SeekResult<'a> {
    /// Nearest keyframe at or before the requested tick.
    pub keyframe: &'a StateSnapshot,
    /// Actions recorded after the keyframe that began before the
    /// requested tick, in order.
    pub actions: &'a [ActionRecord],
}

/// A loaded replay indexed by keyframe.
///
/// Seeking returns the nearest keyframe and the actions needed to roll
/// forward from it, so a viewer never has to scan more than one
/// keyframe interval of events.
#[derive(Clone, Debug)]
pub struct ReplayTimeline {
    metadata: Option<ReplayMetadata>,
    keyframes: Vec<Keyframe>,
    actions: Vec<ActionRecord>,
}

impl ReplayTimeline {
    /// Index a loaded replay. Keyframes are kept in file order.
    pub fn new(replay: LoadedReplay) -> Self {
        let mut keyframes = Vec::new();
        let mut actions = Vec::new();
        for event in replay.events {
            match event {
                ReplayEvent::State { snapshot, .. } => keyframes.push(Keyframe {
                    snapshot,
                    action_index: actions.len(),
                }),
                ReplayEvent::Action(record) => actions.push(record),
            }
        }
        Self {
            metadata: replay.metadata,
            keyframes,
            actions,
        }
    }

    /// The episode metadata, if the log had one.
    pub fn metadata(&self) -> Option<&ReplayMetadata> {
        self.metadata.as_ref()
    }

    /// Keyframe snapshots in file order.
    pub fn keyframes(&self) -> impl Iterator<Item = &StateSnapshot> {
        self.keyframes.iter().map(|k| &k.snapshot)
    }

    /// All recorded actions in file order.
    pub fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }

    /// The last keyframe in the log.
    pub fn final_snapshot(&self) -> Option<&StateSnapshot> {
        self.keyframes.last().map(|k| &k.snapshot)
    }

    fn keyframe_index(&self, tick: u64) -> Option<usize> {
        let after = self.keyframes.partition_point(|k| k.snapshot.tick <= tick);
        after.checked_sub(1)
    }

    /// The latest keyframe whose tick is `<= tick`.
    ///
    /// When two keyframes share a tick the later one wins.
    pub fn keyframe_at_or_before(&self, tick: u64) -> Option<&StateSnapshot> {
        self.keyframe_index(tick).map(|i| &self.keyframes[i].snapshot)
    }

    /// Nearest keyframe plus the actions between it and `tick`.
    ///
    /// Returns `None` if `tick` precedes every keyframe.
    pub fn seek(&self, tick: u64) -> Option<SeekResult<'_>> {
        let frame = &self.keyframes[self.keyframe_index(tick)?];
        let rest = &self.actions[frame.action_index..];
        let len = rest.partition_point(|a| a.tick < tick);
        Some(SeekResult {
            keyframe: &frame.snapshot,
            actions: &rest[..len],
        })
    }
}
