//! Episode recording.
//!
//! [`EpisodeRecorder`] writes one episode's log to a sink: the metadata
//! record, a tick-0 keyframe, one ACTION per step and a STATE keyframe
//! every `keyframe_interval` ticks plus one at episode end.
//! [`RecordingEnv`] wraps a [`KitchenEnv`] and drives a recorder per
//! episode, opening sinks from a [`SinkFactory`] and gzipping them when
//! [`RecordingOptions::compress`] is set.
//!
//! Recording is a strict observer. The wrapped environment behaves
//! identically with or without it, and a recording failure only turns
//! recording off for the rest of that episode.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use galley_core::{NodeId, StateSnapshot};
use galley_engine::{Action, KitchenEnv, StepResult};
use rand::RngCore;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::error::ReplayError;
use crate::types::{map_layout, ActionKind, ActionRecord, MapLayout, ReplayEvent, ReplayMetadata};
use crate::writer::{LogSink, ReplayWriter};

/// Default spacing of STATE keyframes, in ticks.
pub const DEFAULT_KEYFRAME_INTERVAL: u64 = 10;

// ── Options ───────────────────────────────────────────────────────

/// How a [`RecordingEnv`] records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordingOptions {
    /// Record at all. When false the env is passed through untouched.
    pub enabled: bool,
    /// Write a keyframe whenever the clock is a multiple of this.
    /// Zero is treated as one.
    pub keyframe_interval: u64,
    /// Stored in each episode's metadata.
    pub config_path: String,
    /// Gzip each episode's log.
    pub compress: bool,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            keyframe_interval: DEFAULT_KEYFRAME_INTERVAL,
            config_path: String::new(),
            compress: false,
        }
    }
}

// ── Sinks ─────────────────────────────────────────────────────────

/// Opens one output stream per recorded episode.
///
/// Implemented for any `FnMut() -> io::Result<W>`, so tests can hand
/// over a closure returning an in-memory buffer.
pub trait SinkFactory {
    /// The stream type produced.
    type Sink: Write;

    /// Open the stream for a new episode.
    ///
    /// `compressed` says whether gzip data will be written to it, e.g.
    /// to pick a file extension. The caller does the compressing.
    fn open_sink(&mut self, compressed: bool) -> Result<Self::Sink, ReplayError>;
}

impl<W: Write, F: FnMut() -> io::Result<W>> SinkFactory for F {
    type Sink = W;

    fn open_sink(&mut self, _compressed: bool) -> Result<W, ReplayError> {
        Ok(self()?)
    }
}

/// Writes each episode to its own file in a directory.
///
/// Files are named `<prefix>_<YYYYmmdd_HHMMSS_micros>_<short id>.jsonl`,
/// with a further `.gz` when compressed. The directory is created on
/// first use.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    prefix: String,
    last_path: Option<PathBuf>,
}

impl DirectorySink {
    /// Sink writing `<prefix>_….jsonl` files under `dir`.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            last_path: None,
        }
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recently opened file.
    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }

    fn next_file_name(&self, compressed: bool) -> String {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%6f");
        let id = Uuid::new_v4().simple().to_string();
        let ext = if compressed { "jsonl.gz" } else { "jsonl" };
        format!("{}_{}_{}.{ext}", self.prefix, stamp, &id[..8])
    }
}

impl SinkFactory for DirectorySink {
    type Sink = BufWriter<File>;

    fn open_sink(&mut self, compressed: bool) -> Result<Self::Sink, ReplayError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(self.next_file_name(compressed));
        let file = File::create(&path)?;
        tracing::debug!(path = %path.display(), "opened replay file");
        self.last_path = Some(path);
        Ok(BufWriter::new(file))
    }
}

// ── EpisodeRecorder ───────────────────────────────────────────────

/// Records a single episode to one sink.
///
/// Once [`finalize`](Self::finalize) has run, every further call returns
/// [`ReplayError::Closed`]. Dropping an unfinalized recorder flushes and
/// releases the sink.
#[derive(Debug)]
pub struct EpisodeRecorder<W: Write> {
    writer: Option<ReplayWriter<W>>,
    metadata: ReplayMetadata,
    keyframe_interval: u64,
}

impl<W: Write> EpisodeRecorder<W> {
    /// Write the metadata record and the initial keyframe.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if either record cannot be written.
    pub fn start(
        sink: W,
        metadata: ReplayMetadata,
        initial: &StateSnapshot,
        keyframe_interval: u64,
    ) -> Result<Self, ReplayError> {
        let mut writer = ReplayWriter::new(sink);
        writer.write_metadata(&metadata)?;
        writer.write_event(&ReplayEvent::State {
            tick: initial.tick,
            snapshot: initial.clone(),
        })?;
        tracing::info!(
            episode_id = %metadata.episode_id,
            keyframe_interval,
            "recording episode"
        );
        Ok(Self {
            writer: Some(writer),
            metadata,
            keyframe_interval: keyframe_interval.max(1),
        })
    }

    /// Record one step.
    ///
    /// `started_at` and `from` are the clock and agent node before the
    /// action ran. Writes the ACTION, then a keyframe if the clock is on
    /// the interval or the episode just ended.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Closed`] after finalize, or the write error.
    pub fn record_step(
        &mut self,
        started_at: u64,
        from: NodeId,
        action: Action,
        result: &StepResult,
    ) -> Result<(), ReplayError> {
        let writer = self.writer.as_mut().ok_or(ReplayError::Closed)?;

        let (kind, target) = match action {
            Action::Move(target) => (ActionKind::Move, target),
            Action::Interact => (ActionKind::Interact, from),
        };
        writer.write_event(&ReplayEvent::Action(ActionRecord {
            tick: started_at,
            action: kind,
            from,
            target,
            duration: result.time_elapsed,
            result: result.outcome.code(),
        }))?;

        let meta = &mut self.metadata;
        meta.actions_recorded += 1;
        meta.total_ticks = result.snapshot.tick;
        meta.completed_orders = result.snapshot.completed_orders;
        meta.expired_orders += result.expired_orders;

        let tick = result.snapshot.tick;
        if tick % self.keyframe_interval == 0 || result.is_done() {
            writer.write_event(&ReplayEvent::State {
                tick,
                snapshot: result.snapshot.clone(),
            })?;
        }
        Ok(())
    }

    /// Flush and close the log, returning the metadata with totals.
    ///
    /// The metadata line already on disk is not rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Closed`] if already finalized, or the flush
    /// error.
    pub fn finalize(&mut self) -> Result<ReplayMetadata, ReplayError> {
        self.close().map(|(metadata, _)| metadata)
    }

    /// [`finalize`](Self::finalize), also handing back the flushed sink.
    ///
    /// # Errors
    ///
    /// As for [`finalize`](Self::finalize).
    pub fn close(&mut self) -> Result<(ReplayMetadata, W), ReplayError> {
        let writer = self.writer.take().ok_or(ReplayError::Closed)?;
        let events = writer.events_written();
        let sink = writer.finish()?;
        tracing::info!(
            episode_id = %self.metadata.episode_id,
            total_ticks = self.metadata.total_ticks,
            completed_orders = self.metadata.completed_orders,
            expired_orders = self.metadata.expired_orders,
            events,
            "episode recorded"
        );
        Ok((self.metadata.clone(), sink))
    }

    /// Metadata with the totals seen so far.
    pub fn metadata(&self) -> &ReplayMetadata {
        &self.metadata
    }

    /// Whether the log still accepts events.
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl<W: Write> Drop for EpisodeRecorder<W> {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::warn!(error = %e, "failed to flush abandoned replay");
            }
        }
    }
}

// ── RecordingEnv ──────────────────────────────────────────────────

/// A [`KitchenEnv`] that records every episode it runs.
///
/// Each [`reset`](Self::reset) finalizes the running recording, if any,
/// and opens a new sink. The recording is finalized automatically when
/// a step terminates or truncates the episode.
pub struct RecordingEnv<F: SinkFactory, R = ChaCha8Rng> {
    env: KitchenEnv<R>,
    sinks: F,
    options: RecordingOptions,
    layout: MapLayout,
    recorder: Option<EpisodeRecorder<LogSink<F::Sink>>>,
    error: Option<ReplayError>,
    finished: Option<ReplayMetadata>,
}

impl<F: SinkFactory, R: RngCore> RecordingEnv<F, R> {
    /// Wrap `env`, opening one sink per episode from `sinks`.
    pub fn new(env: KitchenEnv<R>, sinks: F, options: RecordingOptions) -> Self {
        let layout = map_layout(env.config());
        Self {
            env,
            sinks,
            options,
            layout,
            recorder: None,
            error: None,
            finished: None,
        }
    }

    /// Start a new episode, recording it if enabled.
    pub fn reset(&mut self) -> StateSnapshot {
        self.finish_recording();
        let snapshot = self.env.reset();
        if self.options.enabled {
            match self.start_recording(&snapshot) {
                Ok(recorder) => self.recorder = Some(recorder),
                Err(e) => self.fail(e),
            }
        }
        snapshot
    }

    fn start_recording(
        &mut self,
        snapshot: &StateSnapshot,
    ) -> Result<EpisodeRecorder<LogSink<F::Sink>>, ReplayError> {
        let compress = self.options.compress;
        let sink = LogSink::new(self.sinks.open_sink(compress)?, compress);
        let metadata = ReplayMetadata::new(self.options.config_path.clone(), self.layout.clone());
        EpisodeRecorder::start(sink, metadata, snapshot, self.options.keyframe_interval)
    }

    /// Step the wrapped env and record the step.
    ///
    /// # Panics
    ///
    /// Panics if a move targets a node outside the graph.
    pub fn step(&mut self, action: Action) -> StepResult {
        let started_at = self.env.world().global_time();
        let from = self.env.world().agent_node();
        let result = self.env.step(action);

        let recorded = self
            .recorder
            .as_mut()
            .map(|rec| rec.record_step(started_at, from, action, &result));
        if let Some(Err(e)) = recorded {
            self.recorder = None;
            self.fail(e);
        }
        if result.is_done() {
            self.finish_recording();
        }
        result
    }

    fn finish_recording(&mut self) {
        if let Some(mut recorder) = self.recorder.take() {
            let closed = recorder.close().and_then(|(metadata, sink)| {
                sink.finish()?;
                Ok(metadata)
            });
            match closed {
                Ok(metadata) => self.finished = Some(metadata),
                Err(e) => self.fail(e),
            }
        }
    }

    fn fail(&mut self, error: ReplayError) {
        tracing::warn!(%error, "recording disabled for the rest of the episode");
        self.error = Some(error);
    }

    /// Valid action ids of the wrapped env.
    pub fn valid_actions(&self) -> BTreeSet<usize> {
        self.env.valid_actions()
    }

    /// Action mask of the wrapped env.
    pub fn action_mask(&self) -> Vec<bool> {
        self.env.action_mask()
    }

    /// The wrapped env.
    pub fn env(&self) -> &KitchenEnv<R> {
        &self.env
    }

    /// Whether the current episode is being recorded.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// The recording options.
    pub fn options(&self) -> &RecordingOptions {
        &self.options
    }

    /// The sink factory, e.g. to ask a [`DirectorySink`] for its last path.
    pub fn sinks(&self) -> &F {
        &self.sinks
    }

    /// Take the most recent recording failure.
    pub fn take_recording_error(&mut self) -> Option<ReplayError> {
        self.error.take()
    }

    /// Metadata of the most recently finalized episode.
    pub fn last_metadata(&self) -> Option<&ReplayMetadata> {
        self.finished.as_ref()
    }

    /// Finalize any running recording and return the wrapped env.
    pub fn into_inner(mut self) -> KitchenEnv<R> {
        self.finish_recording();
        self.env
    }
}
