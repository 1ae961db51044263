/// Catalog snapshot and per-user library data
use crate::types::{PlaylistId, Song, SongId, TrackInfo};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// User playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Playlist identifier
    pub id: PlaylistId,

    /// Display name
    pub name: String,

    /// Member songs, in playlist order
    #[serde(default)]
    pub songs: Vec<SongId>,
}

/// Per-user aggregates kept by the user-data store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserLibraryData {
    /// Songs marked as favorite
    pub favorites: HashSet<SongId>,

    /// Songs marked "suggest less"
    pub suggest_less: HashSet<SongId>,

    /// Cumulative play counts (missing = never played)
    pub play_counts: HashMap<SongId, u32>,

    /// User playlists
    pub playlists: Vec<Playlist>,
}

/// Read-only snapshot of the songs available to the playback engine
///
/// Songs are shared as `Arc<Song>` so queue entries can outlive a catalog
/// refresh without copying metadata.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    songs: Vec<Arc<Song>>,
    index: HashMap<SongId, usize>,
    playlists: Vec<Playlist>,
}

impl Catalog {
    /// Join the track listing with user aggregates
    ///
    /// Duplicate track ids keep their first occurrence.
    pub fn assemble(tracks: Vec<TrackInfo>, user_data: &UserLibraryData) -> Self {
        let mut memberships: HashMap<&SongId, BTreeSet<PlaylistId>> = HashMap::new();
        for playlist in &user_data.playlists {
            for song_id in &playlist.songs {
                memberships
                    .entry(song_id)
                    .or_default()
                    .insert(playlist.id.clone());
            }
        }

        let songs = tracks
            .into_iter()
            .map(|track| {
                let playlists = memberships.get(&track.id).cloned().unwrap_or_default();
                Song {
                    play_count: user_data.play_counts.get(&track.id).copied().unwrap_or(0),
                    is_favorite: user_data.favorites.contains(&track.id),
                    is_suggest_less: user_data.suggest_less.contains(&track.id),
                    playlists,
                    id: track.id,
                    title: track.title,
                    artist: track.artist,
                    album: track.album,
                }
            })
            .collect();

        let mut catalog = Self::from_songs(songs);
        catalog.playlists = user_data.playlists.clone();
        catalog
    }

    /// Build a catalog from fully populated songs
    pub fn from_songs(songs: Vec<Song>) -> Self {
        let mut index = HashMap::with_capacity(songs.len());
        let mut kept = Vec::with_capacity(songs.len());

        for song in songs {
            if index.contains_key(&song.id) {
                tracing::warn!("Duplicate song id in catalog, keeping first: {}", song.id);
                continue;
            }
            index.insert(song.id.clone(), kept.len());
            kept.push(Arc::new(song));
        }

        Self {
            songs: kept,
            index,
            playlists: Vec::new(),
        }
    }

    /// All songs in catalog order
    pub fn songs(&self) -> &[Arc<Song>] {
        &self.songs
    }

    /// Look up a song by id
    pub fn get(&self, id: &SongId) -> Option<&Arc<Song>> {
        self.index.get(id).map(|&i| &self.songs[i])
    }

    /// Resolve ids to songs, skipping ids that are not in the catalog
    pub fn resolve<'a>(&self, ids: impl IntoIterator<Item = &'a SongId>) -> Vec<Arc<Song>> {
        ids.into_iter()
            .filter_map(|id| self.get(id).cloned())
            .collect()
    }

    /// Playlists known to this snapshot
    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    /// Songs of one playlist, in playlist order
    ///
    /// Returns `None` if the playlist is unknown.
    pub fn playlist_songs(&self, id: &PlaylistId) -> Option<Vec<Arc<Song>>> {
        self.playlists
            .iter()
            .find(|p| &p.id == id)
            .map(|p| self.resolve(&p.songs))
    }

    /// Number of songs
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Check if the catalog has no songs
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
