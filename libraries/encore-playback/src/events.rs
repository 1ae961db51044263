//! Playback events and observable values
//!
//! Two ways to follow the engine:
//! - **Observables**: `tokio::sync::watch` receivers for the current song,
//!   the queue snapshot and the shuffle config. They always hold the latest
//!   value; every mutating call publishes before it returns.
//! - **Events**: discrete notifications buffered in order and collected
//!   with `drain_events()`.

use crate::config::{Personality, ShuffleConfig};
use crate::queue::{Queue, QueueId, QueueItem};
use crate::types::PlaybackState;
use encore_core::{Song, SongId};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Coordinator state changed
    StateChanged { state: PlaybackState },

    /// A different entry became current and was handed to the audio output
    TrackChanged {
        song_id: SongId,
        queue_id: QueueId,
        previous_song_id: Option<SongId>,
    },

    /// Track played to its end
    TrackFinished { song_id: SongId },

    /// Queue contents or current pointer changed
    QueueChanged { version: u64, len: usize },

    /// Entry removed, undo possible until the window closes
    RemovalPending {
        queue_id: QueueId,
        index: usize,
        ticket: u64,
    },

    /// Pending removal was put back
    RemovalUndone { queue_id: QueueId, index: usize },

    /// Pending removal became permanent
    RemovalExpired { queue_id: QueueId },

    /// Shuffle configuration replaced
    ConfigChanged { personality: Personality },

    /// Listener seeked within the current track
    Seeked { position_ms: u64 },

    /// Nothing left to play
    QueueExhausted,

    /// External fault reported by the audio engine
    Error { message: String },
}

/// Immutable view of the queue for rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    /// Bumped on every queue mutation
    pub version: u64,

    pub current_index: Option<usize>,

    pub items: Vec<QueueItem>,
}

impl QueueSnapshot {
    pub fn capture(queue: &Queue, version: u64) -> Self {
        Self {
            version,
            current_index: queue.current_index(),
            items: queue.items().to_vec(),
        }
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|i| self.items.get(i))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Publishing side of the observable values
#[derive(Debug)]
pub(crate) struct Observables {
    current_song: watch::Sender<Option<Arc<Song>>>,
    queue: watch::Sender<Arc<QueueSnapshot>>,
    config: watch::Sender<Arc<ShuffleConfig>>,

    // Entry behind the published song, so a replay of the same song counts
    current_entry: Option<QueueId>,
}

impl Observables {
    pub(crate) fn new(config: Arc<ShuffleConfig>) -> Self {
        Self {
            current_song: watch::channel(None).0,
            queue: watch::channel(Arc::new(QueueSnapshot::default())).0,
            config: watch::channel(config).0,
            current_entry: None,
        }
    }

    /// Publish queue state
    ///
    /// The current song is only re-sent when the current entry changes,
    /// including a move to another entry of the same song.
    pub(crate) fn publish_queue(&mut self, queue: &Queue, version: u64) {
        let snapshot = QueueSnapshot::capture(queue, version);
        let current = snapshot
            .current()
            .map(|item| (item.queue_id, Arc::clone(&item.song)));

        self.queue.send_replace(Arc::new(snapshot));

        let entry = current.as_ref().map(|(queue_id, _)| *queue_id);
        if entry != self.current_entry {
            self.current_entry = entry;
            self.current_song.send_replace(current.map(|(_, song)| song));
        }
    }

    pub(crate) fn publish_config(&self, config: Arc<ShuffleConfig>) {
        self.config.send_replace(config);
    }

    pub(crate) fn subscribe_current_song(&self) -> watch::Receiver<Option<Arc<Song>>> {
        self.current_song.subscribe()
    }

    pub(crate) fn subscribe_queue(&self) -> watch::Receiver<Arc<QueueSnapshot>> {
        self.queue.subscribe()
    }

    pub(crate) fn subscribe_config(&self) -> watch::Receiver<Arc<ShuffleConfig>> {
        self.config.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_song(id: &str) -> Arc<Song> {
        Arc::new(Song::new(id, id, "Artist", "Album"))
    }

    #[test]
    fn publish_reaches_late_subscribers() {
        let mut observables = Observables::new(Arc::new(ShuffleConfig::default()));
        let mut queue = Queue::from_songs([create_test_song("a"), create_test_song("b")]);
        queue.set_current(Some(1)).unwrap();

        observables.publish_queue(&queue, 3);

        let snapshot = observables.subscribe_queue().borrow().clone();
        assert_eq!(snapshot.version, 3);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.current().unwrap().song.id.as_str(), "b");

        let song = observables.subscribe_current_song().borrow().clone();
        assert_eq!(song.unwrap().id.as_str(), "b");
    }

    #[test]
    fn current_song_only_notifies_on_change() {
        let mut observables = Observables::new(Arc::new(ShuffleConfig::default()));
        let mut queue = Queue::from_songs([create_test_song("a"), create_test_song("b")]);
        queue.set_current(Some(0)).unwrap();
        observables.publish_queue(&queue, 1);

        let rx = observables.subscribe_current_song();

        queue.toggle_priority(1).unwrap();
        observables.publish_queue(&queue, 2);
        assert!(!rx.has_changed().unwrap());

        queue.advance();
        observables.publish_queue(&queue, 3);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn current_song_notifies_on_next_entry_of_same_song() {
        let mut observables = Observables::new(Arc::new(ShuffleConfig::default()));
        let song = create_test_song("a");
        let mut queue = Queue::from_songs([Arc::clone(&song), song]);
        queue.set_current(Some(0)).unwrap();
        observables.publish_queue(&queue, 1);

        let mut rx = observables.subscribe_current_song();
        rx.borrow_and_update();

        queue.advance();
        observables.publish_queue(&queue, 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().id.as_str(), "a");

        queue.set_current(None).unwrap();
        observables.publish_queue(&queue, 3);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PlaybackEvent::QueueChanged { version: 2, len: 5 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "queueChanged");
        assert_eq!(json["len"], 5);
    }
}
