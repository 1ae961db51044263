//! Saved queue record
//!
//! Flat, serde-friendly form of the queue. Songs are referenced by id and
//! resolved against the catalog on restore.

use crate::queue::{Queue, QueueId, QueueItem};
use chrono::{DateTime, Utc};
use encore_core::{Catalog, SongId};
use serde::{Deserialize, Serialize};

/// One saved queue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStateItem {
    pub queue_id: QueueId,
    pub song_id: SongId,
    #[serde(default)]
    pub is_priority: bool,
    pub added_at: DateTime<Utc>,
}

/// Saved queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    pub items: Vec<QueueStateItem>,

    /// `None` when nothing was loaded
    pub current_index: Option<usize>,

    pub version: u64,
}

impl QueueState {
    pub fn from_queue(queue: &Queue, version: u64) -> Self {
        Self {
            items: queue
                .items()
                .iter()
                .map(|item| QueueStateItem {
                    queue_id: item.queue_id,
                    song_id: item.song.id.clone(),
                    is_priority: item.is_priority,
                    added_at: item.added_at,
                })
                .collect(),
            current_index: queue.current_index(),
            version,
        }
    }

    /// Rebuild a queue against `catalog`
    ///
    /// Entries whose song is gone are dropped. The current pointer follows
    /// its entry; if that entry was dropped it moves to the next surviving
    /// one, or to nothing. Returns the queue and how many entries were
    /// dropped.
    pub fn into_queue(self, catalog: &Catalog) -> (Queue, usize) {
        let mut items = Vec::with_capacity(self.items.len());
        let mut current = None;
        let mut dropped = 0;

        for (index, saved) in self.items.into_iter().enumerate() {
            let Some(song) = catalog.get(&saved.song_id) else {
                tracing::warn!("Saved queue references unknown song: {}", saved.song_id);
                dropped += 1;
                continue;
            };

            if current.is_none() && self.current_index.is_some_and(|c| index >= c) {
                current = Some(items.len());
            }

            items.push(QueueItem {
                queue_id: QueueId::from_persisted(saved.queue_id.value()),
                song: std::sync::Arc::clone(song),
                is_priority: saved.is_priority,
                added_at: saved.added_at,
            });
        }

        (Queue::from_items(items, current), dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::Song;

    fn catalog() -> Catalog {
        Catalog::from_songs(
            ["a", "b", "c"]
                .into_iter()
                .map(|id| Song::new(id, id, "Artist", "Album"))
                .collect(),
        )
    }

    fn queue(catalog: &Catalog) -> Queue {
        let mut queue = Queue::from_songs(catalog.songs().iter().cloned());
        queue.set_current(Some(1)).unwrap();
        queue.toggle_priority(2).unwrap();
        queue
    }

    #[test]
    fn state_uses_camel_case() {
        let catalog = catalog();
        let state = QueueState::from_queue(&queue(&catalog), 4);
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["currentIndex"], 1);
        assert_eq!(json["version"], 4);
        assert!(json["items"][0].get("queueId").is_some());
        assert_eq!(json["items"][2]["isPriority"], true);
    }

    #[test]
    fn restore_keeps_ids_and_pointer() {
        let catalog = catalog();
        let original = queue(&catalog);
        let state = QueueState::from_queue(&original, 1);

        let (restored, dropped) = state.into_queue(&catalog);
        assert_eq!(dropped, 0);
        assert_eq!(restored.current_index(), Some(1));
        assert_eq!(restored.items(), original.items());
    }

    #[test]
    fn restore_skips_unknown_songs_and_moves_pointer() {
        let catalog = catalog();
        let mut state = QueueState::from_queue(&queue(&catalog), 1);
        state.items[1].song_id = "gone".into();

        let (restored, dropped) = state.into_queue(&catalog);
        assert_eq!(dropped, 1);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.current_item().unwrap().song.id.as_str(), "c");
    }

    #[test]
    fn restore_with_current_past_survivors() {
        let catalog = catalog();
        let mut state = QueueState::from_queue(&queue(&catalog), 1);
        state.current_index = Some(2);
        state.items[2].song_id = "gone".into();

        let (restored, _) = state.into_queue(&catalog);
        assert_eq!(restored.current_index(), None);
    }
}
