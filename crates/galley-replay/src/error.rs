//! Error types for the replay system.

use std::io;

/// Errors that can occur while recording, loading or verifying a replay.
///
/// None of these ever stop a simulation: the recorder reports them to
/// its caller and carries on without recording.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// An I/O error occurred during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A record could not be encoded or decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// `write_metadata` was called twice.
    #[error("metadata already written")]
    MetadataAlreadyWritten,
    /// An event was written before the metadata record.
    #[error("metadata must be written before events")]
    MetadataMissing,
    /// An earlier write failed partway, so the stream may end in a
    /// partial record. Nothing more is written to it.
    #[error("replay writer poisoned by an earlier write failure")]
    Poisoned,
    /// The log was already finalized.
    #[error("replay log is closed")]
    Closed,
    /// An event record is missing fields required by its type.
    #[error("malformed event: {detail}")]
    MalformedEvent {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}
