//! Replay log loader.
//!
//! [`ReplayLoader`] reads a whole log from any `BufRead` source, plain or
//! gzip-compressed; the two are told apart by the gzip magic bytes.
//! Loading is forgiving: blank lines are skipped and each malformed line,
//! whether bad UTF-8 or bad JSON, becomes a [`LineWarning`] instead of
//! failing the load. A compressed stream that ends early or turns
//! corrupt keeps everything decoded before the damage. Only other I/O
//! errors abort.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::bufread::GzDecoder;

use crate::error::ReplayError;
use crate::types::{MetadataRecord, ReplayEvent, ReplayMetadata};

/// A line that could not be parsed and was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineWarning {
    /// 1-based line number.
    pub line: usize,
    /// Parser message.
    pub detail: String,
}

/// Everything recovered from a log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadedReplay {
    /// The metadata record, if the first well-formed line was one.
    pub metadata: Option<ReplayMetadata>,
    /// Events in file order.
    pub events: Vec<ReplayEvent>,
    /// Lines that were skipped.
    pub warnings: Vec<LineWarning>,
}

impl LoadedReplay {
    fn warn(&mut self, line: usize, detail: String) {
        tracing::warn!(line, %detail, "skipping malformed replay line");
        self.warnings.push(LineWarning { line, detail });
    }

    /// Keyframe snapshots in file order.
    pub fn states(&self) -> impl Iterator<Item = &galley_core::StateSnapshot> {
        self.events.iter().filter_map(|e| match e {
            ReplayEvent::State { snapshot, .. } => Some(snapshot),
            ReplayEvent::Action(_) => None,
        })
    }
}

/// First two bytes of every gzip stream.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decoder errors that mean the rest of the stream is lost, as opposed
/// to the source itself failing.
fn is_damaged_stream(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData
    )
}

/// Reads replay logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReplayLoader;

impl ReplayLoader {
    /// Load a log from a reader.
    ///
    /// The first well-formed line is taken as metadata if it is a
    /// `{"metadata": …}` record; any later metadata record is treated as
    /// a malformed event line.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] if reading fails.
    pub fn load<R: BufRead>(mut reader: R) -> Result<LoadedReplay, ReplayError> {
        if reader.fill_buf()?.starts_with(&GZIP_MAGIC) {
            Self::load_lines(BufReader::new(GzDecoder::new(reader)))
        } else {
            Self::load_lines(reader)
        }
    }

    fn load_lines<R: BufRead>(mut reader: R) -> Result<LoadedReplay, ReplayError> {
        let mut loaded = LoadedReplay::default();
        let mut seen_record = false;
        let mut buf = Vec::new();
        let mut line_no = 0;

        loop {
            buf.clear();
            line_no += 1;
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if is_damaged_stream(&e) => {
                    loaded.warn(line_no, format!("unreadable from here on: {e}"));
                    break;
                }
                Err(e) => return Err(e.into()),
            }
            let text = match std::str::from_utf8(&buf) {
                Ok(text) => text.trim(),
                Err(e) => {
                    loaded.warn(line_no, format!("invalid UTF-8: {e}"));
                    continue;
                }
            };
            if text.is_empty() {
                continue;
            }

            if !seen_record {
                if let Ok(record) = serde_json::from_str::<MetadataRecord>(text) {
                    loaded.metadata = Some(record.metadata);
                    seen_record = true;
                    continue;
                }
            }

            match serde_json::from_str::<ReplayEvent>(text) {
                Ok(event) => {
                    loaded.events.push(event);
                    seen_record = true;
                }
                Err(e) => loaded.warn(line_no, e.to_string()),
            }
        }
        Ok(loaded)
    }

    /// Load a log file, compressed or not.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] if the file cannot be opened or read.
    pub fn load_path(path: impl AsRef<Path>) -> Result<LoadedReplay, ReplayError> {
        let file = File::open(path)?;
        Self::load(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const META: &str = r#"{"metadata":{"version":"1.0","episode_id":"67e55044-10b1-426f-9247-bb680e5fe0c8","config_path":"","start_time":"2026-01-01T00:00:00Z","total_ticks":0,"completed_orders":0,"expired_orders":0,"actions_recorded":0,"map_layout":{}}}"#;
    const ACTION: &str = r#"{"tick":0,"type":"ACTION","action":"MOVE","from":0,"target":1,"duration":2,"result":"Move_0_to_1"}"#;

    #[test]
    fn metadata_then_events() {
        let text = format!("{META}\n{ACTION}\n");
        let loaded = ReplayLoader::load(text.as_bytes()).unwrap();
        assert_eq!(loaded.metadata.unwrap().version, "1.0");
        assert_eq!(loaded.events.len(), 1);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn blank_and_malformed_lines() {
        let text = format!("{META}\n\n   \n{{not json\n{ACTION}\n{{\"tick\":1}}\n{ACTION}");
        let loaded = ReplayLoader::load(text.as_bytes()).unwrap();
        assert!(loaded.metadata.is_some());
        assert_eq!(loaded.events.len(), 2);
        let lines: Vec<_> = loaded.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![4, 6]);
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        // A crash mid-write can cut a multibyte character in half.
        let mut bytes = format!("{META}\n").into_bytes();
        bytes.extend_from_slice(b"{\"tick\":1,\"name\":\"Caf\xc3\n");
        bytes.extend_from_slice(format!("{ACTION}\n").as_bytes());
        let loaded = ReplayLoader::load(bytes.as_slice()).unwrap();
        assert!(loaded.metadata.is_some());
        assert_eq!(loaded.events.len(), 1);
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].line, 2);
        assert!(loaded.warnings[0].detail.contains("UTF-8"));
    }

    #[test]
    fn gzip_input_is_detected() {
        let text = format!("{META}\n{ACTION}\n{ACTION}\n");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        let gz = enc.finish().unwrap();
        assert_eq!(gz[..2], GZIP_MAGIC);

        let loaded = ReplayLoader::load(gz.as_slice()).unwrap();
        assert_eq!(loaded, ReplayLoader::load(text.as_bytes()).unwrap());
        assert_eq!(loaded.events.len(), 2);
    }

    #[test]
    fn truncated_gzip_keeps_what_decoded() {
        let mut text = format!("{META}\n");
        for _ in 0..200 {
            text.push_str(ACTION);
            text.push('\n');
        }
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        let gz = enc.finish().unwrap();

        // Lose half the trailer: the body still decodes in full.
        let cut = &gz[..gz.len() - 4];
        let loaded = ReplayLoader::load(cut).unwrap();
        assert!(loaded.metadata.is_some());
        assert_eq!(loaded.events.len(), 200);
        assert!(loaded.warnings.len() <= 1);
    }

    #[test]
    fn missing_metadata() {
        let text = format!("{ACTION}\n{META}\n");
        let loaded = ReplayLoader::load(text.as_bytes()).unwrap();
        assert!(loaded.metadata.is_none());
        assert_eq!(loaded.events.len(), 1);
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].line, 2);
    }

    #[test]
    fn metadata_after_leading_garbage() {
        let text = format!("garbage\n{META}\n{ACTION}\n");
        let loaded = ReplayLoader::load(text.as_bytes()).unwrap();
        assert!(loaded.metadata.is_some());
        assert_eq!(loaded.events.len(), 1);
        assert_eq!(loaded.warnings[0].line, 1);
    }

    #[test]
    fn empty_input() {
        let loaded = ReplayLoader::load(&b""[..]).unwrap();
        assert_eq!(loaded, LoadedReplay::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ReplayLoader::load_path(dir.path().join("nope.jsonl")),
            Err(ReplayError::Io(_))
        ));
    }
}
