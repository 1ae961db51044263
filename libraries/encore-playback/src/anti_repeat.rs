//! Anti-repeat tracking
//!
//! Bounded recency record of what was played, consulted by the selector.

use encore_core::{Song, SongId};
use std::collections::VecDeque;

/// Window size for a scope of `scope_len` songs
///
/// Half the scope, at least one, at most `history_limit`. Keeping the window
/// below the scope size leaves the hard song filter something to pick from.
pub fn scaled_window(scope_len: usize, history_limit: usize) -> usize {
    (scope_len / 2).clamp(1, history_limit.max(1))
}

/// Rolling record of recently played songs, artists and albums
///
/// Front of each list is the most recent play (rank 0). The song list is
/// de-duplicated so a replayed song moves back to the front. Artist and
/// album lists keep one slot per play, `None` for placeholder names, so the
/// "previous selection" checks line up with the actual play order.
#[derive(Debug, Clone)]
pub struct AntiRepeatTracker {
    songs: VecDeque<SongId>,
    artists: VecDeque<Option<String>>,
    albums: VecDeque<Option<String>>,
    window: usize,
}

impl AntiRepeatTracker {
    /// Create an empty tracker; `window` is raised to at least 1
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            songs: VecDeque::with_capacity(window),
            artists: VecDeque::with_capacity(window),
            albums: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record a play
    pub fn record_play(&mut self, song: &Song) {
        if let Some(pos) = self.songs.iter().position(|id| id == &song.id) {
            self.songs.remove(pos);
        }
        self.songs.push_front(song.id.clone());

        self.artists
            .push_front(song.has_known_artist().then(|| name_key(&song.artist)));
        self.albums
            .push_front(song.has_known_album().then(|| name_key(&song.album)));

        self.evict();
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.songs.clear();
        self.artists.clear();
        self.albums.clear();
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Resize the window; shrinking evicts the oldest entries
    pub fn set_window(&mut self, window: usize) {
        self.window = window.max(1);
        self.evict();
    }

    /// Recency rank of a song (0 = most recent), `None` if outside the window
    pub fn song_rank(&self, id: &SongId) -> Option<usize> {
        self.songs.iter().position(|s| s == id)
    }

    /// Recency rank of an artist name (case-insensitive)
    pub fn artist_rank(&self, artist: &str) -> Option<usize> {
        rank_of(&self.artists, artist)
    }

    /// Recency rank of an album name (case-insensitive)
    pub fn album_rank(&self, album: &str) -> Option<usize> {
        rank_of(&self.albums, album)
    }

    /// Whether the song's artist matches one of the last `depth` plays
    pub fn artist_in_last(&self, song: &Song, depth: usize) -> bool {
        song.has_known_artist() && in_first(&self.artists, &song.artist, depth)
    }

    /// Whether the song's album matches one of the last `depth` plays
    pub fn album_in_last(&self, song: &Song, depth: usize) -> bool {
        song.has_known_album() && in_first(&self.albums, &song.album, depth)
    }

    /// Normalized artist names of the last `depth` plays, most recent first
    ///
    /// `None` marks a play whose artist was a placeholder.
    pub fn recent_artists(&self, depth: usize) -> impl Iterator<Item = Option<&str>> {
        self.artists.iter().take(depth).map(Option::as_deref)
    }

    /// Normalized album names of the last `depth` plays, most recent first
    pub fn recent_albums(&self, depth: usize) -> impl Iterator<Item = Option<&str>> {
        self.albums.iter().take(depth).map(Option::as_deref)
    }

    /// Most recently played song
    pub fn last_song(&self) -> Option<&SongId> {
        self.songs.front()
    }

    /// Songs in the window, most recent first
    pub fn recent_songs(&self) -> impl Iterator<Item = &SongId> {
        self.songs.iter()
    }

    /// Number of distinct songs in the window
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    fn evict(&mut self) {
        self.songs.truncate(self.window);
        self.artists.truncate(self.window);
        self.albums.truncate(self.window);
    }
}

impl Default for AntiRepeatTracker {
    fn default() -> Self {
        Self::new(50)
    }
}

/// Case-folded, trimmed form under which artist and album names are compared
pub fn name_key(name: &str) -> String {
    name.trim().chars().flat_map(char::to_lowercase).collect()
}

/// Compare a stored key against a raw name without allocating
fn key_matches(key: &str, name: &str) -> bool {
    key.chars()
        .eq(name.trim().chars().flat_map(char::to_lowercase))
}

fn rank_of(list: &VecDeque<Option<String>>, name: &str) -> Option<usize> {
    list.iter()
        .position(|entry| entry.as_deref().is_some_and(|key| key_matches(key, name)))
}

fn in_first(list: &VecDeque<Option<String>>, name: &str, depth: usize) -> bool {
    list.iter()
        .take(depth)
        .any(|entry| entry.as_deref().is_some_and(|key| key_matches(key, name)))
}
