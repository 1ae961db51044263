//! External audio engine boundary
//!
//! The engine never decodes audio. It tells an [`AudioOutput`] what to do
//! and hears back through the coordinator's `on_track_completed`,
//! `on_seek` and `on_error` callbacks.

use crate::error::Result;
use encore_core::{Song, SongId};
use std::sync::{Arc, Mutex};

/// Audio engine driven by the playback coordinator
///
/// Implementations should return quickly; decoding happens on their side.
pub trait AudioOutput: Send {
    /// Start playing a song from the beginning
    ///
    /// # Errors
    /// `AudioOutput` if the engine cannot open the song
    fn load(&mut self, song: &Song) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    /// Stop and release the current song
    fn stop(&mut self) -> Result<()>;
}

/// Command received by a [`RecordingOutput`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCommand {
    Load(SongId),
    Pause,
    Resume,
    Stop,
}

/// Silent output that records every command
///
/// Clones share one log, so a host can keep a handle after giving the
/// output to the coordinator. Used by simulations and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    log: Arc<Mutex<Vec<OutputCommand>>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands so far
    pub fn commands(&self) -> Vec<OutputCommand> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Songs loaded so far, in order
    pub fn loaded(&self) -> Vec<SongId> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                OutputCommand::Load(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, command: OutputCommand) {
        if let Ok(mut log) = self.log.lock() {
            log.push(command);
        }
    }
}

impl AudioOutput for RecordingOutput {
    fn load(&mut self, song: &Song) -> Result<()> {
        self.record(OutputCommand::Load(song.id.clone()));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(OutputCommand::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.record(OutputCommand::Resume);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(OutputCommand::Stop);
        Ok(())
    }
}
