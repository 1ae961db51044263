//! Playback coordinator
//!
//! State machine between the queue manager and the external audio engine:
//!
//! ```text
//!            play / init            pause
//!   Idle ─────────────────> Playing ─────> Paused
//!    ^                        │  ^   <─────
//!    │ exhausted              │  │   resume
//!    │                completed  │ next entry
//!    │                        v  │
//!    └──────────────────── Advancing
//! ```
//!
//! The coordinator owns the [`QueueManager`]. Queue edits go through it so
//! that removing the playing entry, or running out of entries, moves
//! playback along.

use crate::config::{Personality, ShuffleConfig};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::manager::{QueueManager, Removal};
use crate::output::AudioOutput;
use crate::queue::{QueueId, QueueItem};
use crate::state::QueueState;
use crate::types::PlaybackState;
use encore_core::{Catalog, Song, SongId};
use std::sync::Arc;
use std::time::Duration;

/// Drives an [`AudioOutput`] from a [`QueueManager`]
pub struct PlaybackCoordinator {
    manager: QueueManager,
    output: Box<dyn AudioOutput>,
    state: PlaybackState,
    position: Duration,
    last_started: Option<SongId>,
}

impl PlaybackCoordinator {
    pub fn new(manager: QueueManager, output: Box<dyn AudioOutput>) -> Self {
        Self {
            manager,
            output,
            state: PlaybackState::Idle,
            position: Duration::ZERO,
            last_started: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Read access to the queue manager
    pub fn manager(&self) -> &QueueManager {
        &self.manager
    }

    /// Last position reported by `on_seek` for the current track
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Take all buffered events, oldest first
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.manager.drain_events()
    }

    // ===== Playback Control =====

    /// Start playback, or resume if paused
    ///
    /// From idle, plays the current entry, or the first one if nothing is
    /// current yet.
    ///
    /// # Errors
    /// `NothingLoaded` if the queue is empty
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Idle | PlaybackState::Advancing => {
                if self.manager.queue().current_item().is_some()
                    || self.manager.advance_pointer().is_some()
                {
                    self.start_current()
                } else {
                    Err(PlaybackError::NothingLoaded)
                }
            }
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            self.output.pause()?;
            self.set_state(PlaybackState::Paused);
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state == PlaybackState::Paused {
            self.output.resume()?;
            self.set_state(PlaybackState::Playing);
        }
        Ok(())
    }

    /// Stop playback; the queue and current entry are kept
    pub fn stop(&mut self) -> Result<()> {
        if self.state != PlaybackState::Idle {
            self.position = Duration::ZERO;
            self.set_state(PlaybackState::Idle);
            self.output.stop()?;
        }
        Ok(())
    }

    /// Move to the next entry now
    ///
    /// # Errors
    /// `NothingLoaded` if the queue is empty
    pub fn skip_forward(&mut self) -> Result<()> {
        if self.manager.queue().is_empty() {
            return Err(PlaybackError::NothingLoaded);
        }
        self.advance()
    }

    /// Move to the previous entry, or restart the first one
    pub fn skip_backward(&mut self) -> Result<()> {
        if self.manager.retreat_pointer().is_none()
            && self.manager.queue().current_item().is_none()
        {
            return Err(PlaybackError::NothingLoaded);
        }
        self.start_current()
    }

    /// Jump to any entry and start it
    pub fn skip_to(&mut self, index: usize) -> Result<()> {
        self.manager.set_current(index)?;
        self.start_current()
    }

    // ===== Audio Engine Callbacks =====

    /// Current track played to its end
    pub fn on_track_completed(&mut self) -> Result<()> {
        if self.state == PlaybackState::Idle {
            tracing::debug!("Ignoring completion while idle");
            return Ok(());
        }

        if let Some(song) = self.manager.current_song() {
            self.manager.emit(PlaybackEvent::TrackFinished {
                song_id: song.id.clone(),
            });
        }
        self.advance()
    }

    /// Listener seeked within the current track
    pub fn on_seek(&mut self, position: Duration) {
        self.position = position;
        self.manager.emit(PlaybackEvent::Seeked {
            position_ms: u64::try_from(position.as_millis()).unwrap_or(u64::MAX),
        });
    }

    /// Audio engine failed on the current track; skip it
    pub fn on_error(&mut self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        tracing::warn!("Audio engine error: {}", message);
        self.manager.emit(PlaybackEvent::Error { message });

        if self.state == PlaybackState::Idle {
            return Ok(());
        }
        self.advance()
    }

    // ===== Queue Commands =====

    /// Build a queue from `songs`; starts playing when `auto_select` is set
    pub fn init(&mut self, songs: Vec<Arc<Song>>, auto_select: bool) -> Result<()> {
        self.manager.init_queue(songs, auto_select)?;
        if auto_select {
            self.start_current()
        } else {
            self.stop()
        }
    }

    /// Shuffle a scope and start its first entry
    pub fn shuffle_and_play(&mut self, songs: &[Arc<Song>], is_restricted: bool) -> Result<()> {
        self.manager.shuffle_and_play(songs, is_restricted)?;
        self.start_current()
    }

    /// Play `songs` verbatim with no weighted draws
    pub fn play_sequence(&mut self, songs: Vec<Arc<Song>>) -> Result<()> {
        self.manager.load_sequence(songs)?;
        self.start_current()
    }

    pub fn refresh_queue(&mut self) -> Result<()> {
        self.manager.refresh_queue()
    }

    pub fn insert_into_queue(&mut self, index: usize, item: QueueItem) -> Result<()> {
        self.manager.insert_into_queue(index, item)
    }

    pub fn add_next(&mut self, song: Arc<Song>) -> Result<QueueId> {
        self.manager.add_next(song)
    }

    pub fn add_to_end(&mut self, song: Arc<Song>) -> Result<QueueId> {
        self.manager.add_to_end(song)
    }

    /// Remove an entry; removing the playing one starts whatever follows
    pub fn remove_from_queue(&mut self, index: usize) -> Result<Removal> {
        let removal = self.manager.remove_from_queue(index)?;

        if removal.was_current && self.state != PlaybackState::Idle {
            if self.manager.queue().current_item().is_some() {
                self.start_current()?;
            } else {
                self.set_state(PlaybackState::Advancing);
                self.continue_past_end()?;
            }
        }
        Ok(removal)
    }

    pub fn undo_removal(&mut self) -> Result<usize> {
        self.manager.undo_removal()
    }

    pub fn poll_timers(&mut self) -> Option<QueueItem> {
        self.manager.poll_timers()
    }

    pub fn reorder_queue(&mut self, old_index: usize, new_index: usize) -> Result<()> {
        self.manager.reorder_queue(old_index, new_index)
    }

    pub fn toggle_priority(&mut self, index: usize) -> Result<bool> {
        self.manager.toggle_priority(index)
    }

    pub fn clear_upcoming(&mut self) -> usize {
        self.manager.clear_upcoming()
    }

    pub fn update_config(&mut self, config: ShuffleConfig) -> Result<()> {
        self.manager.update_config(config)
    }

    pub fn apply_personality(&mut self, personality: Personality) -> Result<()> {
        self.manager.apply_personality(personality)
    }

    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.manager.replace_catalog(catalog);
    }

    pub fn export_state(&self) -> QueueState {
        self.manager.export_state()
    }

    /// Replace the queue with a saved one; playback stops
    pub fn restore_state(&mut self, state: QueueState) -> Result<usize> {
        self.stop()?;
        Ok(self.manager.restore_state(state))
    }

    // ===== Internals =====

    fn advance(&mut self) -> Result<()> {
        self.set_state(PlaybackState::Advancing);
        if self.manager.advance_pointer().is_some() {
            return self.start_current();
        }
        self.continue_past_end()
    }

    /// Nothing follows the current entry: extend the queue or go idle
    fn continue_past_end(&mut self) -> Result<()> {
        if self.manager.engine_config().continuous && !self.manager.is_force_linear() {
            match self.manager.extend_queue() {
                Ok(first) => {
                    self.manager.set_current(first)?;
                    return self.start_current();
                }
                Err(e) => tracing::warn!("Could not extend queue: {}", e),
            }
        }

        tracing::info!("Queue exhausted");
        self.position = Duration::ZERO;
        self.set_state(PlaybackState::Idle);
        self.manager.emit(PlaybackEvent::QueueExhausted);
        self.output.stop()
    }

    /// Hand the current entry to the audio output
    fn start_current(&mut self) -> Result<()> {
        let Some(item) = self.manager.queue().current_item().cloned() else {
            return Err(PlaybackError::NothingLoaded);
        };

        if let Err(e) = self.output.load(&item.song) {
            self.set_state(PlaybackState::Idle);
            return Err(e);
        }

        self.manager.record_current_play();
        self.position = Duration::ZERO;

        tracing::debug!("Now playing {} ({})", item.song.id, item.queue_id);
        let previous_song_id = self.last_started.replace(item.song.id.clone());
        self.manager.emit(PlaybackEvent::TrackChanged {
            song_id: item.song.id.clone(),
            queue_id: item.queue_id,
            previous_song_id,
        });
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::trace!("Playback state {:?} -> {:?}", self.state, state);
            self.state = state;
            self.manager.emit(PlaybackEvent::StateChanged { state });
        }
    }
}
