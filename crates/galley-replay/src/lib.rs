//! Episode recording and deterministic replay for Galley kitchens.
//!
//! Records what happened in an episode as a snapshot+delta log and reads
//! it back for viewers and determinism checks.
//!
//! # Architecture
//!
//! - [`EpisodeRecorder`] and [`RecordingEnv`] record episodes as they run
//! - [`ReplayWriter`] streams records to any `Write` sink, gzipped
//!   through a [`LogSink`] when asked
//! - [`ReplayLoader`] reads a log back, plain or gzipped, skipping
//!   malformed lines
//! - [`ReplayTimeline`] seeks to the nearest keyframe
//! - [`compare_snapshot`] and [`replay_and_compare`] verify determinism
//!
//! # Format
//!
//! ```text
//! {"metadata": {...}}                          one line, first
//! {"tick": 0, "type": "STATE", "snapshot": {...}}
//! {"tick": 0, "type": "ACTION", "action": "MOVE", ...}
//! ...
//! ```
//!
//! ACTION events are stamped with the tick the action began. STATE
//! keyframes land every `keyframe_interval` ticks and at episode end.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod compare;
pub mod error;
pub mod hash;
pub mod reader;
pub mod recorder;
pub mod timeline;
pub mod types;
pub mod writer;

pub use compare::{compare_snapshot, replay_and_compare, Divergence, DivergenceReport};
pub use error::ReplayError;
pub use hash::snapshot_hash;
pub use reader::{LineWarning, LoadedReplay, ReplayLoader};
pub use recorder::{
    DirectorySink, EpisodeRecorder, RecordingEnv, RecordingOptions, SinkFactory,
    DEFAULT_KEYFRAME_INTERVAL,
};
pub use timeline::{ReplayTimeline, SeekResult};
pub use types::{
    map_layout, ActionKind, ActionRecord, MapEntry, MapLayout, MetadataRecord, ReplayEvent,
    ReplayMetadata, FORMAT_VERSION,
};
pub use writer::{is_gzip_path, LogSink, ReplayWriter};
