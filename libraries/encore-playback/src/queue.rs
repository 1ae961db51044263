//! Play queue
//!
//! A flat ordered list of entries with an optional current pointer:
//!
//! ```text
//!   0  Track A   (played)
//!   1  Track B   (played)
//! > 2  Track C   current
//!   3  Track D   upcoming
//!   4  Track E * upcoming, priority
//! ```
//!
//! Priority is a flag on the entry, never a separate tier, so a manual
//! drag order is exactly what gets played.

use crate::error::{PlaybackError, Result};
use chrono::{DateTime, Utc};
use encore_core::Song;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique queue entry id
///
/// Distinct from the song id: one song may sit in the queue several times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(u64);

impl QueueId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Adopt an id read back from a saved queue
    ///
    /// Future ids from [`QueueId::next`] are allocated past it.
    pub fn from_persisted(raw: u64) -> Self {
        NEXT_QUEUE_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Self(raw)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// One queue entry
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub queue_id: QueueId,
    pub song: Arc<Song>,
    pub is_priority: bool,
    pub added_at: DateTime<Utc>,
}

impl QueueItem {
    /// New entry with a fresh id
    pub fn new(song: Arc<Song>) -> Self {
        Self {
            queue_id: QueueId::next(),
            song,
            is_priority: false,
            added_at: Utc::now(),
        }
    }

    /// New entry flagged as priority
    pub fn priority(song: Arc<Song>) -> Self {
        Self {
            is_priority: true,
            ..Self::new(song)
        }
    }
}

/// Ordered queue with a current pointer
///
/// `current` is `None` or a valid index, and queue ids are unique; every
/// method keeps both true or fails without touching the queue.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: Vec<QueueItem>,
    current: Option<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue with one fresh entry per song, nothing current
    pub fn from_songs(songs: impl IntoIterator<Item = Arc<Song>>) -> Self {
        Self {
            items: songs.into_iter().map(QueueItem::new).collect(),
            current: None,
        }
    }

    /// Build from existing entries
    ///
    /// Entries with a repeated queue id are dropped; an out-of-range
    /// `current` becomes `None`.
    pub fn from_items(items: Vec<QueueItem>, current: Option<usize>) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(items.len());
        let items: Vec<QueueItem> = items
            .into_iter()
            .filter(|item| seen.insert(item.queue_id))
            .collect();
        let current = current.filter(|&i| i < items.len());
        Self { items, current }
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Index of an entry by queue id
    pub fn position_of(&self, queue_id: QueueId) -> Option<usize> {
        self.items.iter().position(|item| item.queue_id == queue_id)
    }

    /// Whether anything follows the current entry
    pub fn has_next(&self) -> bool {
        match self.current {
            Some(i) => i + 1 < self.items.len(),
            None => !self.items.is_empty(),
        }
    }

    /// Entries after the current one (everything if nothing is current)
    pub fn upcoming(&self) -> &[QueueItem] {
        match self.current {
            Some(i) => &self.items[i + 1..],
            None => &self.items,
        }
    }

    /// Entries at or before the current one
    pub fn played_and_current(&self) -> &[QueueItem] {
        match self.current {
            Some(i) => &self.items[..=i],
            None => &[],
        }
    }

    /// Point at an entry, or at nothing
    pub fn set_current(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            self.check_index(i)?;
        }
        self.current = index;
        Ok(())
    }

    /// Move the pointer forward; `None` when already at the end
    pub fn advance(&mut self) -> Option<usize> {
        let next = self.current.map_or(0, |i| i + 1);
        if next < self.items.len() {
            self.current = Some(next);
            Some(next)
        } else {
            None
        }
    }

    /// Move the pointer back; `None` when already at the start
    pub fn retreat(&mut self) -> Option<usize> {
        match self.current {
            Some(i) if i > 0 => {
                self.current = Some(i - 1);
                Some(i - 1)
            }
            _ => None,
        }
    }

    /// Insert an entry at `index` (0..=len)
    ///
    /// Inserting at or before the current entry shifts the pointer so it
    /// keeps pointing at the same entry.
    pub fn insert(&mut self, index: usize, item: QueueItem) -> Result<()> {
        if index > self.items.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        if self.position_of(item.queue_id).is_some() {
            return Err(PlaybackError::DuplicateQueueId(item.queue_id));
        }

        self.items.insert(index, item);
        if let Some(current) = self.current {
            if index <= current {
                self.current = Some(current + 1);
            }
        }
        Ok(())
    }

    /// Append an entry
    pub fn push(&mut self, item: QueueItem) -> Result<()> {
        self.insert(self.items.len(), item)
    }

    /// Remove the entry at `index`
    ///
    /// Returns the entry and whether it was the current one. Removing the
    /// current entry leaves the pointer on the same index, which now holds
    /// the following entry, or on nothing if it was last.
    pub fn remove(&mut self, index: usize) -> Result<(QueueItem, bool)> {
        self.check_index(index)?;

        let item = self.items.remove(index);
        let was_current = self.current == Some(index);
        self.current = match self.current {
            Some(c) if index < c => Some(c - 1),
            Some(c) if index == c => (c < self.items.len()).then_some(c),
            other => other,
        };
        Ok((item, was_current))
    }

    /// Move the entry at `from` to `to`
    ///
    /// The pointer follows the current entry wherever it ends up.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if let Some(c) = self.current {
            self.current = Some(if c == from {
                to
            } else if from < c && to >= c {
                c - 1
            } else if from > c && to <= c {
                c + 1
            } else {
                c
            });
        }
        Ok(())
    }

    /// Flip the priority flag; returns the new value
    pub fn toggle_priority(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let item = &mut self.items[index];
        item.is_priority = !item.is_priority;
        Ok(item.is_priority)
    }

    /// Drop everything after the current entry (everything if none)
    ///
    /// Returns how many entries were removed.
    pub fn truncate_after_current(&mut self) -> usize {
        let keep = self.current.map_or(0, |i| i + 1);
        let removed = self.items.len().saturating_sub(keep);
        self.items.truncate(keep);
        removed
    }

    /// Replace everything after the current entry
    pub fn replace_upcoming(&mut self, upcoming: Vec<QueueItem>) {
        self.truncate_after_current();
        self.items.extend(upcoming);
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(PlaybackError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }
}
