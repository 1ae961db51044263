//! Queue manager
//!
//! Single authority for queue mutation. Owns the queue, the live
//! anti-repeat history, the undo window and the observable values.
//!
//! Every public mutation validates before it touches anything, so a failed
//! call leaves queue and configuration exactly as they were.

use crate::anti_repeat::{scaled_window, AntiRepeatTracker};
use crate::config::{Personality, ShuffleConfig};
use crate::error::{PlaybackError, Result};
use crate::events::{Observables, PlaybackEvent, QueueSnapshot};
use crate::queue::{Queue, QueueId, QueueItem};
use crate::selector::WeightedSelector;
use crate::state::QueueState;
use crate::types::EngineConfig;
use crate::undo::{Clock, SystemClock, UndoWindow};
use encore_core::{Catalog, Song, SongId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Entry taken out of the queue by [`QueueManager::remove_from_queue`]
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub item: QueueItem,

    /// Index the entry had
    pub index: usize,

    /// Whether it was the current entry; playback must move on
    pub was_current: bool,
}

/// Adaptive play-queue manager
pub struct QueueManager {
    catalog: Arc<Catalog>,
    config: Arc<ShuffleConfig>,
    engine: EngineConfig,

    queue: Queue,
    version: u64,

    // Shuffle scope and its selector; an unrestricted scope follows the catalog
    scope: Vec<Arc<Song>>,
    scope_restricted: bool,
    selector: WeightedSelector,

    // Records actual plays only; generation draws use a scratch copy
    tracker: AntiRepeatTracker,

    force_linear: bool,

    undo: UndoWindow,
    clock: Box<dyn Clock>,
    rng: StdRng,

    observables: Observables,
    pending_events: Vec<PlaybackEvent>,
}

impl QueueManager {
    /// Create a manager over a catalog snapshot, with an empty queue
    ///
    /// The whole catalog is the initial shuffle scope.
    pub fn new(catalog: Catalog, config: ShuffleConfig, engine: EngineConfig) -> Self {
        let catalog = Arc::new(catalog);
        let config = Arc::new(config);
        let scope = catalog.songs().to_vec();
        let rng = engine
            .rng_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let history_cap = history_cap(&config, &engine);
        let mut manager = Self {
            selector: WeightedSelector::new(&scope),
            tracker: AntiRepeatTracker::new(scaled_window(scope.len(), history_cap)),
            undo: UndoWindow::new(engine.undo_timeout),
            observables: Observables::new(Arc::clone(&config)),
            catalog,
            config,
            engine,
            queue: Queue::new(),
            version: 0,
            scope,
            scope_restricted: false,
            force_linear: false,
            clock: Box::new(SystemClock),
            rng,
            pending_events: Vec::new(),
        };
        manager.publish();
        manager
    }

    /// Replace the time source (tests and simulations)
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ===== Queries =====

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Queue version, bumped on every mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot::capture(&self.queue, self.version)
    }

    pub fn current_song(&self) -> Option<Arc<Song>> {
        self.queue
            .current_item()
            .map(|item| Arc::clone(&item.song))
    }

    /// Songs new shuffles draw from
    pub fn scope(&self) -> &[Arc<Song>] {
        &self.scope
    }

    /// Live anti-repeat history
    pub fn tracker(&self) -> &AntiRepeatTracker {
        &self.tracker
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Whether a fixed sequence is playing (no weighted draws)
    pub fn is_force_linear(&self) -> bool {
        self.force_linear
    }

    /// Whether a removal can still be undone
    pub fn can_undo(&self) -> bool {
        self.undo.is_live(self.clock.now())
    }

    // ===== Configuration =====

    pub fn current_config(&self) -> Arc<ShuffleConfig> {
        Arc::clone(&self.config)
    }

    /// Replace the shuffle configuration
    ///
    /// Applies to future draws only; the queue is not regenerated.
    ///
    /// # Errors
    /// `InvalidConfig` if the config breaks its invariants
    pub fn update_config(&mut self, config: ShuffleConfig) -> Result<()> {
        config.validate()?;

        if config.personality() != self.config.personality() {
            tracing::info!(
                "Shuffle personality: {} -> {}",
                self.config.personality().label(),
                config.personality().label()
            );
        }

        let personality = config.personality();
        self.config = Arc::new(config);
        self.resize_window();
        self.observables.publish_config(Arc::clone(&self.config));
        self.emit(PlaybackEvent::ConfigChanged { personality });
        Ok(())
    }

    /// Switch to a personality preset, keeping history limit and playlists
    pub fn apply_personality(&mut self, personality: Personality) -> Result<()> {
        let next = self.config.with_personality(personality);
        self.update_config(next)
    }

    /// Swap in a fresh catalog snapshot
    ///
    /// Queue entries keep the song data they were created with. A full
    /// library scope becomes the new catalog; a restricted scope is
    /// re-resolved against it and songs that disappeared drop out.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        let scope = if self.scope_restricted {
            catalog.resolve(self.scope.iter().map(|song| &song.id))
        } else {
            catalog.songs().to_vec()
        };

        tracing::info!(
            "Catalog replaced: {} songs, scope {} songs",
            catalog.len(),
            scope.len()
        );

        self.catalog = Arc::new(catalog);
        self.set_scope(scope, self.scope_restricted);
    }

    // ===== Queue Generation =====

    /// Build a fresh queue from `songs`, in the given order
    ///
    /// With `auto_select`, the current entry is picked by the weighted
    /// selector; otherwise nothing is current until playback starts.
    ///
    /// # Errors
    /// `EmptyCandidateSet` if `auto_select` is set and `songs` is empty
    pub fn init_queue(&mut self, songs: Vec<Arc<Song>>, auto_select: bool) -> Result<()> {
        let current = if auto_select {
            let selector = WeightedSelector::new(&songs);
            Some(selector.select(&songs, &self.config, &self.tracker, &mut self.rng)?)
        } else {
            None
        };

        tracing::debug!(
            "Initializing queue with {} songs (current: {:?})",
            songs.len(),
            current
        );

        self.discard_pending_removal();
        self.force_linear = false;
        self.set_scope(songs.clone(), true);
        self.queue = Queue::from_songs(songs);
        if current.is_some() {
            self.queue.set_current(current)?;
        }
        self.queue_changed();
        Ok(())
    }

    /// Shuffle a scope into a new queue and point at its first entry
    ///
    /// The scope is `songs` when `is_restricted`, otherwise the whole
    /// catalog. Anti-repeat history starts over. Leaves linear mode.
    ///
    /// # Errors
    /// `EmptyCandidateSet` if the scope is empty
    pub fn shuffle_and_play(&mut self, songs: &[Arc<Song>], is_restricted: bool) -> Result<()> {
        let scope = if is_restricted {
            songs.to_vec()
        } else {
            self.catalog.songs().to_vec()
        };
        if scope.is_empty() {
            return Err(PlaybackError::EmptyCandidateSet);
        }

        let selector = WeightedSelector::new(&scope);
        let window = scaled_window(scope.len(), self.history_cap());
        let mut scratch = AntiRepeatTracker::new(window);
        let drawn = selector.draw_sequence(
            scope.clone(),
            self.engine.max_generated_queue.max(1),
            &self.config,
            &mut scratch,
            &mut self.rng,
        )?;

        tracing::info!(
            "Shuffled {} of {} songs ({} personality, {})",
            drawn.len(),
            scope.len(),
            self.config.personality().label(),
            if is_restricted { "restricted" } else { "full library" }
        );

        self.discard_pending_removal();
        self.force_linear = false;
        self.tracker.clear();
        self.set_scope(scope, is_restricted);
        self.queue = Queue::from_songs(drawn);
        self.queue.set_current(Some(0))?;
        self.queue_changed();
        Ok(())
    }

    /// Re-draw the unplayed part of the queue
    ///
    /// Played entries and the current entry stay put. Priority entries in
    /// the tail are kept, in their order, at the front of the new tail; the
    /// rest is replaced by the same number of fresh weighted draws, avoiding
    /// songs already played in this queue when possible.
    ///
    /// # Errors
    /// `LinearMode` while a fixed sequence plays, `EmptyCandidateSet` if
    /// the scope is empty
    pub fn refresh_queue(&mut self) -> Result<()> {
        if self.force_linear {
            return Err(PlaybackError::LinearMode);
        }

        let (priority, regular): (Vec<QueueItem>, Vec<QueueItem>) = self
            .queue
            .upcoming()
            .iter()
            .cloned()
            .partition(|item| item.is_priority);
        if regular.is_empty() {
            return Ok(());
        }

        let exclude: HashSet<SongId> = self
            .queue
            .played_and_current()
            .iter()
            .chain(priority.iter())
            .map(|item| item.song.id.clone())
            .collect();
        let fresh = self.draw_tail(&exclude, regular.len())?;

        tracing::debug!(
            "Refreshed {} upcoming entries ({} priority kept)",
            fresh.len(),
            priority.len()
        );

        let mut upcoming = priority;
        upcoming.extend(fresh);
        self.queue.replace_upcoming(upcoming);
        self.queue_changed();
        Ok(())
    }

    /// Append a fresh run of draws after the last entry
    ///
    /// Used by continuous playback when the queue runs out. Returns the
    /// index of the first appended entry.
    ///
    /// # Errors
    /// `LinearMode` while a fixed sequence plays, `EmptyCandidateSet` if
    /// the scope is empty
    pub fn extend_queue(&mut self) -> Result<usize> {
        if self.force_linear {
            return Err(PlaybackError::LinearMode);
        }

        let exclude: HashSet<SongId> = self
            .queue
            .items()
            .last()
            .map(|item| item.song.id.clone())
            .into_iter()
            .collect();
        let target = self.scope.len().min(self.engine.max_generated_queue).max(1);
        let fresh = self.draw_tail(&exclude, target)?;

        let first = self.queue.len();
        tracing::info!("Queue exhausted, appending {} entries", fresh.len());
        for item in fresh {
            self.queue.push(item)?;
        }
        self.queue_changed();
        Ok(first)
    }

    /// Replace the queue with a fixed sequence played verbatim
    ///
    /// Enters linear mode: no weighted draws until the next shuffle.
    ///
    /// # Errors
    /// `NothingLoaded` if `songs` is empty
    pub fn load_sequence(&mut self, songs: Vec<Arc<Song>>) -> Result<()> {
        if songs.is_empty() {
            return Err(PlaybackError::NothingLoaded);
        }

        tracing::info!("Playing fixed sequence of {} songs", songs.len());

        self.discard_pending_removal();
        self.force_linear = true;
        self.queue = Queue::from_songs(songs);
        self.queue.set_current(Some(0))?;
        self.queue_changed();
        Ok(())
    }

    // ===== Queue Editing =====

    /// Insert an entry at `index` (0..=len)
    pub fn insert_into_queue(&mut self, index: usize, item: QueueItem) -> Result<()> {
        self.queue.insert(index, item)?;
        tracing::debug!("Inserted entry at {}", index);
        self.queue_changed();
        Ok(())
    }

    /// Insert a song right after the current entry (at the front if none)
    pub fn add_next(&mut self, song: Arc<Song>) -> Result<QueueId> {
        let index = self.queue.current_index().map_or(0, |i| i + 1);
        let item = QueueItem::new(song);
        let queue_id = item.queue_id;
        self.insert_into_queue(index, item)?;
        Ok(queue_id)
    }

    /// Append a song
    pub fn add_to_end(&mut self, song: Arc<Song>) -> Result<QueueId> {
        let item = QueueItem::new(song);
        let queue_id = item.queue_id;
        self.insert_into_queue(self.queue.len(), item)?;
        Ok(queue_id)
    }

    /// Remove the entry at `index` and open an undo window for it
    ///
    /// A removal still pending from before becomes permanent.
    pub fn remove_from_queue(&mut self, index: usize) -> Result<Removal> {
        let (item, was_current) = self.queue.remove(index)?;

        let (ticket, displaced) = self.undo.arm(item.clone(), index, self.clock.now());
        if let Some(old) = displaced {
            self.emit(PlaybackEvent::RemovalExpired {
                queue_id: old.item.queue_id,
            });
        }

        tracing::debug!(
            "Removed {} at {} (current: {})",
            item.song.id,
            index,
            was_current
        );

        self.emit(PlaybackEvent::RemovalPending {
            queue_id: item.queue_id,
            index,
            ticket,
        });
        self.queue_changed();

        Ok(Removal {
            item,
            index,
            was_current,
        })
    }

    /// Put the pending removal back
    ///
    /// Reinserts at the index it was removed from, clamped to the current
    /// length. Returns the index used.
    ///
    /// # Errors
    /// `NothingToUndo` if there is no pending removal or its window closed
    pub fn undo_removal(&mut self) -> Result<usize> {
        let now = self.clock.now();
        let Some(pending) = self.undo.take_live(now) else {
            return Err(PlaybackError::NothingToUndo);
        };

        let index = pending.absolute_index.min(self.queue.len());
        let queue_id = pending.item.queue_id;
        if let Err(e) = self.queue.insert(index, pending.item.clone()) {
            self.undo.restore(pending);
            return Err(e);
        }

        tracing::debug!("Undid removal of {} at {}", queue_id, index);
        self.emit(PlaybackEvent::RemovalUndone { queue_id, index });
        self.queue_changed();
        Ok(index)
    }

    /// Close an expired undo window
    ///
    /// The host calls this from its event loop. Returns the entry whose
    /// removal became permanent, if any.
    pub fn poll_timers(&mut self) -> Option<QueueItem> {
        let expired = self.undo.expire(self.clock.now())?;
        tracing::debug!("Removal of {} is now permanent", expired.item.queue_id);
        self.emit(PlaybackEvent::RemovalExpired {
            queue_id: expired.item.queue_id,
        });
        Some(expired.item)
    }

    /// Move an entry; the current pointer follows the playing entry
    pub fn reorder_queue(&mut self, old_index: usize, new_index: usize) -> Result<()> {
        self.queue.move_item(old_index, new_index)?;
        tracing::debug!("Moved entry {} -> {}", old_index, new_index);
        self.queue_changed();
        Ok(())
    }

    /// Flip an entry's priority flag; order is not changed
    pub fn toggle_priority(&mut self, index: usize) -> Result<bool> {
        let is_priority = self.queue.toggle_priority(index)?;
        self.queue_changed();
        Ok(is_priority)
    }

    /// Drop everything after the current entry; returns how many
    pub fn clear_upcoming(&mut self) -> usize {
        let removed = self.queue.truncate_after_current();
        tracing::debug!("Cleared {} upcoming entries", removed);
        self.queue_changed();
        removed
    }

    // ===== Persistence =====

    pub fn export_state(&self) -> QueueState {
        QueueState::from_queue(&self.queue, self.version)
    }

    /// Replace the queue with a saved one
    ///
    /// Songs missing from the catalog are skipped. The whole catalog becomes
    /// the shuffle scope. Returns how many entries were skipped.
    pub fn restore_state(&mut self, state: QueueState) -> usize {
        let saved_version = state.version;
        let (queue, dropped) = state.into_queue(&self.catalog);

        tracing::info!(
            "Restored queue: {} entries ({} skipped)",
            queue.len(),
            dropped
        );

        self.discard_pending_removal();
        self.force_linear = false;
        self.set_scope(self.catalog.songs().to_vec(), false);
        self.queue = queue;
        self.version = self.version.max(saved_version);
        self.queue_changed();
        dropped
    }

    // ===== Observables =====

    pub fn subscribe_current_song(&self) -> watch::Receiver<Option<Arc<Song>>> {
        self.observables.subscribe_current_song()
    }

    pub fn subscribe_queue(&self) -> watch::Receiver<Arc<QueueSnapshot>> {
        self.observables.subscribe_queue()
    }

    pub fn subscribe_config(&self) -> watch::Receiver<Arc<ShuffleConfig>> {
        self.observables.subscribe_config()
    }

    /// Take all buffered events, oldest first
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Playback Hooks =====

    pub(crate) fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    /// Move the pointer forward without generating anything
    pub(crate) fn advance_pointer(&mut self) -> Option<usize> {
        let next = self.queue.advance()?;
        self.queue_changed();
        Some(next)
    }

    pub(crate) fn retreat_pointer(&mut self) -> Option<usize> {
        let previous = self.queue.retreat()?;
        self.queue_changed();
        Some(previous)
    }

    pub(crate) fn set_current(&mut self, index: usize) -> Result<()> {
        self.queue.set_current(Some(index))?;
        self.queue_changed();
        Ok(())
    }

    /// Record that the current entry started playing
    pub(crate) fn record_current_play(&mut self) {
        if let Some(item) = self.queue.current_item() {
            let song = Arc::clone(&item.song);
            self.tracker.record_play(&song);
        }
    }

    // ===== Internals =====

    fn history_cap(&self) -> usize {
        history_cap(&self.config, &self.engine)
    }

    fn set_scope(&mut self, scope: Vec<Arc<Song>>, restricted: bool) {
        self.selector = WeightedSelector::new(&scope);
        self.scope = scope;
        self.scope_restricted = restricted;
        self.resize_window();
    }

    fn resize_window(&mut self) {
        let window = scaled_window(self.scope.len(), self.history_cap());
        self.tracker.set_window(window);
    }

    /// Draw `target` entries from the scope for the queue tail
    ///
    /// Prefers songs outside `exclude`. When that pool runs dry it refills
    /// from the whole scope minus the last pick, so a small scope still
    /// yields `target` entries.
    fn draw_tail(&mut self, exclude: &HashSet<SongId>, target: usize) -> Result<Vec<QueueItem>> {
        if self.scope.is_empty() {
            return Err(PlaybackError::EmptyCandidateSet);
        }

        let mut scratch = self.tracker.clone();
        let mut pool: Vec<Arc<Song>> = self
            .scope
            .iter()
            .filter(|song| !exclude.contains(&song.id))
            .cloned()
            .collect();

        let mut drawn: Vec<Arc<Song>> = Vec::with_capacity(target);
        while drawn.len() < target {
            if pool.is_empty() {
                let last = drawn.last().map(|song| song.id.clone());
                pool = self
                    .scope
                    .iter()
                    .filter(|song| Some(&song.id) != last.as_ref())
                    .cloned()
                    .collect();
                if pool.is_empty() {
                    pool = self.scope.clone();
                }
            }

            let batch = self.selector.draw_sequence(
                std::mem::take(&mut pool),
                target - drawn.len(),
                &self.config,
                &mut scratch,
                &mut self.rng,
            )?;
            drawn.extend(batch);
        }

        Ok(drawn.into_iter().map(QueueItem::new).collect())
    }

    fn discard_pending_removal(&mut self) {
        if let Some(old) = self.undo.cancel() {
            self.emit(PlaybackEvent::RemovalExpired {
                queue_id: old.item.queue_id,
            });
        }
    }

    fn queue_changed(&mut self) {
        self.version += 1;
        self.emit(PlaybackEvent::QueueChanged {
            version: self.version,
            len: self.queue.len(),
        });
        self.publish();
    }

    fn publish(&mut self) {
        self.observables.publish_queue(&self.queue, self.version);
    }
}

fn history_cap(config: &ShuffleConfig, engine: &EngineConfig) -> usize {
    config.history_limit().min(engine.history_limit).max(1)
}
