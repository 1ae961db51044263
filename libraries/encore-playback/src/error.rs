//! Error types for the playback engine

use crate::queue::QueueId;
use thiserror::Error;

/// Playback engine errors
///
/// Every error is a local, synchronous caller-side failure. The queue and
/// configuration are left exactly as they were before the failing call.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Selector asked to draw from an empty candidate list
    #[error("Cannot select from an empty candidate set")]
    EmptyCandidateSet,

    /// Stale or invalid queue index
    #[error("Index {index} out of range for queue of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Weight or multiplier outside its allowed domain
    #[error("Invalid shuffle configuration: {0}")]
    InvalidConfig(String),

    /// Operation needs a current track but nothing is loaded
    #[error("No track loaded")]
    NothingLoaded,

    /// Selector-based operation requested while playing a fixed sequence
    #[error("Queue is in linear mode; weighted selection is disabled")]
    LinearMode,

    /// Undo requested with no live pending removal
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Queue entry id already present in the queue
    #[error("Queue id {0} is already in the queue")]
    DuplicateQueueId(QueueId),

    /// External audio engine rejected a command
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Collaborator failure
    #[error(transparent)]
    Core(#[from] encore_core::CoreError),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an audio output error
    pub fn audio_output(msg: impl Into<String>) -> Self {
        Self::AudioOutput(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
