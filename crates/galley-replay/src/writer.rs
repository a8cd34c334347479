//! Replay log writer.
//!
//! [`ReplayWriter`] streams records to any `Write` sink as
//! newline-delimited JSON. The metadata record must come first, exactly
//! once; events follow. A failed write poisons the writer.
//!
//! [`LogSink`] optionally gzips the stream on its way to the sink.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::ReplayError;
use crate::types::{MetadataRecord, ReplayEvent, ReplayMetadata};

// ── LogSink ───────────────────────────────────────────────────────

/// A log's output stream, plain or gzip-compressed.
///
/// Call [`finish`](Self::finish) to write the gzip trailer and see any
/// error doing so. Dropping also writes it, silently.
pub enum LogSink<W: Write> {
    /// JSON lines as-is.
    Plain(W),
    /// JSON lines through a gzip encoder.
    Gzip(GzEncoder<W>),
}

impl<W: Write> LogSink<W> {
    /// Wrap `inner`, compressing if asked.
    pub fn new(inner: W, compress: bool) -> Self {
        if compress {
            Self::Gzip(GzEncoder::new(inner, Compression::default()))
        } else {
            Self::Plain(inner)
        }
    }

    /// Whether output is gzipped.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Gzip(_))
    }

    /// Complete the stream and return the flushed inner sink.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from writing the trailer or flushing.
    pub fn finish(self) -> io::Result<W> {
        let mut inner = match self {
            Self::Plain(w) => w,
            Self::Gzip(enc) => enc.finish()?,
        };
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for LogSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(enc) => enc.flush(),
        }
    }
}

impl<W: Write> fmt::Debug for LogSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("compressed", &self.is_compressed())
            .finish_non_exhaustive()
    }
}

/// Whether a log path names a gzip file.
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

// ── ReplayWriter ──────────────────────────────────────────────────

/// Writes a replay log to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`. Dropping the writer drops the sink,
/// which for a `BufWriter` flushes it.
///
/// # Examples
///
/// ```
/// use galley_core::{NodeId, StateSnapshot};
/// use galley_replay::{ReplayEvent, ReplayLoader, ReplayMetadata, ReplayWriter};
///
/// let meta = ReplayMetadata::new("inline", Default::default());
///
/// let mut writer = ReplayWriter::new(Vec::new());
/// writer.write_metadata(&meta).unwrap();
/// let snapshot = StateSnapshot::empty(0, NodeId(0));
/// writer
///     .write_event(&ReplayEvent::State { tick: 0, snapshot })
///     .unwrap();
/// assert_eq!(writer.events_written(), 1);
/// let buf = writer.finish().unwrap();
///
/// let loaded = ReplayLoader::load(buf.as_slice()).unwrap();
/// assert_eq!(loaded.metadata, Some(meta));
/// assert_eq!(loaded.events.len(), 1);
/// assert!(loaded.warnings.is_empty());
/// ```
#[derive(Debug)]
pub struct ReplayWriter<W: Write> {
    writer: W,
    metadata_written: bool,
    events_written: u64,
    poisoned: bool,
}

impl ReplayWriter<LogSink<BufWriter<File>>> {
    /// Create (or truncate) a log file, creating parent directories.
    /// Paths ending in `.gz` are gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] if the directory or file cannot be
    /// created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        Ok(Self::new(LogSink::new(file, is_gzip_path(path))))
    }
}

impl<W: Write> ReplayWriter<W> {
    /// Wrap a sink. Nothing is written until [`write_metadata`](Self::write_metadata).
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            metadata_written: false,
            events_written: 0,
            poisoned: false,
        }
    }

    /// Write the metadata record. Must be the first call, exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::MetadataAlreadyWritten`] on a second call,
    /// [`ReplayError::Poisoned`] after a failed write, or the write error.
    pub fn write_metadata(&mut self, metadata: &ReplayMetadata) -> Result<(), ReplayError> {
        if self.poisoned {
            return Err(ReplayError::Poisoned);
        }
        if self.metadata_written {
            return Err(ReplayError::MetadataAlreadyWritten);
        }
        let record = MetadataRecord {
            metadata: metadata.clone(),
        };
        self.write_line(&record)?;
        self.metadata_written = true;
        Ok(())
    }

    /// Append one event.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::MetadataMissing`] before the metadata,
    /// [`ReplayError::Poisoned`] after a failed write, or the write error.
    pub fn write_event(&mut self, event: &ReplayEvent) -> Result<(), ReplayError> {
        if self.poisoned {
            return Err(ReplayError::Poisoned);
        }
        if !self.metadata_written {
            return Err(ReplayError::MetadataMissing);
        }
        self.write_line(event)?;
        self.events_written += 1;
        Ok(())
    }

    fn write_line<T: serde::Serialize>(&mut self, record: &T) -> Result<(), ReplayError> {
        // Cleared only once the whole line is out.
        self.poisoned = true;
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.poisoned = false;
        Ok(())
    }

    /// Whether an earlier write failed.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of events written so far (metadata excluded).
    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Whether the metadata record has been written.
    pub fn has_metadata(&self) -> bool {
        self.metadata_written
    }

    /// Flush and return the underlying sink. No further writes are
    /// possible once the writer is consumed.
    pub fn finish(mut self) -> Result<W, ReplayError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley_core::{NodeId, StateSnapshot};
    use std::io;

    /// Accepts `budget` bytes, fails once, then accepts everything.
    struct Hiccup {
        out: Vec<u8>,
        budget: usize,
        tripped: bool,
    }

    impl Write for Hiccup {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.tripped && self.out.len() + buf.len() > self.budget {
                self.tripped = true;
                return Err(io::Error::other("disk full"));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn meta() -> ReplayMetadata {
        ReplayMetadata::new("test", Default::default())
    }

    fn state(tick: u64) -> ReplayEvent {
        ReplayEvent::State {
            tick,
            snapshot: StateSnapshot::empty(tick, NodeId(0)),
        }
    }

    #[test]
    fn event_before_metadata_rejected() {
        let mut w = ReplayWriter::new(Vec::new());
        assert!(matches!(
            w.write_event(&state(0)),
            Err(ReplayError::MetadataMissing)
        ));
        assert!(w.finish().unwrap().is_empty());
    }

    #[test]
    fn metadata_only_once() {
        let mut w = ReplayWriter::new(Vec::new());
        w.write_metadata(&meta()).unwrap();
        assert!(matches!(
            w.write_metadata(&meta()),
            Err(ReplayError::MetadataAlreadyWritten)
        ));
        assert!(w.has_metadata());
    }

    #[test]
    fn failed_metadata_write_is_not_retried() {
        let sink = Hiccup {
            out: Vec::new(),
            budget: 24,
            tripped: false,
        };
        let mut w = ReplayWriter::new(sink);
        assert!(w.write_metadata(&meta()).is_err());
        assert!(w.is_poisoned());
        assert!(!w.has_metadata());

        // The sink would accept these now; the writer refuses them.
        assert!(matches!(
            w.write_metadata(&meta()),
            Err(ReplayError::Poisoned)
        ));
        assert!(matches!(w.write_event(&state(0)), Err(ReplayError::Poisoned)));

        let out = w.finish().unwrap().out;
        assert!(out.len() <= 24);
        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches(r#"{"metadata""#).count(), 1);
        assert!(!text.contains('\n'));
    }

    #[test]
    fn one_record_per_line() {
        let mut w = ReplayWriter::new(Vec::new());
        w.write_metadata(&meta()).unwrap();
        w.write_event(&state(0)).unwrap();
        w.write_event(&state(10)).unwrap();
        let buf = w.finish().unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(r#"{"metadata":"#));
        assert!(lines[2].contains(r#""type":"STATE""#));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/episode.jsonl");
        let mut w = ReplayWriter::create(&path).unwrap();
        w.write_metadata(&meta()).unwrap();
        drop(w);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn gz_path_is_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.jsonl.gz");
        let m = meta();
        let mut w = ReplayWriter::create(&path).unwrap();
        w.write_metadata(&m).unwrap();
        w.write_event(&state(0)).unwrap();
        w.finish().unwrap().finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes[..2], [0x1f, 0x8b]);
        let loaded = crate::reader::ReplayLoader::load_path(&path).unwrap();
        assert_eq!(loaded.metadata, Some(m));
        assert_eq!(loaded.events, vec![state(0)]);
    }
}
