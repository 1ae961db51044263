//! Encore - Playback Queue Engine
//!
//! Decides what plays next and keeps the play queue consistent.
//!
//! This crate provides:
//! - Immutable shuffle configuration with personality presets
//! - Weighted random selection (favorites, play counts, playlists)
//! - Anti-repeat tracking for songs, artists and albums
//! - A play queue with insert, remove, reorder and priority flags
//! - Time-bounded undo for removals
//! - A playback coordinator driving an external audio engine
//!
//! # Architecture
//!
//! `encore-playback` never decodes audio or touches storage:
//! - The catalog arrives as an [`encore_core::Catalog`] snapshot
//! - Audio is driven through the [`AudioOutput`] trait
//! - Settings persistence goes through [`ShuffleConfigStore`]
//!
//! The host constructs one [`QueueManager`], wraps it in a
//! [`PlaybackCoordinator`], and calls into it from a single event loop.
//!
//! # Example: Shuffle a Library
//!
//! ```rust
//! use encore_core::{Catalog, Song};
//! use encore_playback::{
//!     EngineConfig, PlaybackCoordinator, PlaybackState, QueueManager, RecordingOutput,
//!     ShuffleConfig,
//! };
//!
//! let catalog = Catalog::from_songs(vec![
//!     Song::new("a.mp3", "Alpha", "Band", "Debut"),
//!     Song::new("b.mp3", "Beta", "Band", "Debut"),
//!     Song::new("c.mp3", "Gamma", "Solo", "Other"),
//! ]);
//!
//! let manager = QueueManager::new(catalog, ShuffleConfig::default(), EngineConfig::default());
//! let output = RecordingOutput::new();
//! let mut player = PlaybackCoordinator::new(manager, Box::new(output.clone()));
//!
//! player.shuffle_and_play(&[], false)?;
//! assert_eq!(player.state(), PlaybackState::Playing);
//! assert_eq!(player.manager().queue().len(), 3);
//!
//! player.on_track_completed()?;
//! assert_eq!(output.loaded().len(), 2);
//! # Ok::<(), encore_playback::PlaybackError>(())
//! ```
//!
//! # Example: Personalities
//!
//! ```rust
//! use encore_playback::{Personality, ShuffleConfig, ShuffleOverrides};
//!
//! let config = ShuffleConfig::default().with_personality(Personality::Explorer);
//! assert_eq!(config.least_played_weight(), 80);
//!
//! // Out-of-range weights are clamped, never rejected
//! let tuned = config.copy_with(ShuffleOverrides {
//!     favorites_weight: Some(500),
//!     ..Default::default()
//! });
//! assert_eq!(tuned.favorites_weight(), 99);
//! ```

#![forbid(unsafe_code)]

pub mod anti_repeat;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod manager;
pub mod output;
pub mod queue;
pub mod selector;
pub mod state;
pub mod types;
pub mod undo;

pub use anti_repeat::{scaled_window, AntiRepeatTracker};
pub use config::{
    Personality, PersonalityBundle, ShuffleConfig, ShuffleConfigRecord, ShuffleConfigStore,
    ShuffleOverrides,
};
pub use coordinator::PlaybackCoordinator;
pub use error::{PlaybackError, Result};
pub use events::{PlaybackEvent, QueueSnapshot};
pub use manager::{QueueManager, Removal};
pub use output::{AudioOutput, OutputCommand, RecordingOutput};
pub use queue::{Queue, QueueId, QueueItem};
pub use selector::{axis_factor, PlayCountStats, WeightedSelector, EPSILON};
pub use state::{QueueState, QueueStateItem};
pub use types::{EngineConfig, PlaybackState};
pub use undo::{Clock, ManualClock, PendingRemoval, SystemClock, UndoWindow};
