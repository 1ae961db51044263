/// Song domain types
use crate::types::{PlaylistId, SongId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Artist/album names the library scanner writes when tags are missing.
const PLACEHOLDER_NAMES: &[&str] = &["", "unknown", "unknown artist", "unknown album"];

/// Track listing entry as supplied by the library scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Stable identifier (library filename)
    #[serde(alias = "filename")]
    pub id: SongId,

    /// Track title
    #[serde(default)]
    pub title: String,

    /// Artist name
    #[serde(default)]
    pub artist: String,

    /// Album name
    #[serde(default)]
    pub album: String,
}

impl TrackInfo {
    /// Create a track listing entry
    pub fn new(
        id: impl Into<SongId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }
}

/// Song with per-user aggregates, as seen by the playback engine
///
/// Immutable for the duration of a queue session. A catalog refresh
/// replaces the whole snapshot rather than editing songs in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Stable identifier (library filename)
    pub id: SongId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Cumulative play count for the current user
    pub play_count: u32,

    /// User marked this song as a favorite
    pub is_favorite: bool,

    /// User asked to hear this song less often
    pub is_suggest_less: bool,

    /// Playlists containing this song
    pub playlists: BTreeSet<PlaylistId>,
}

impl Song {
    /// Create a song with no user aggregates
    pub fn new(
        id: impl Into<SongId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            play_count: 0,
            is_favorite: false,
            is_suggest_less: false,
            playlists: BTreeSet::new(),
        }
    }

    /// Whether the artist tag carries a real name
    pub fn has_known_artist(&self) -> bool {
        !is_placeholder(&self.artist)
    }

    /// Whether the album tag carries a real name
    pub fn has_known_album(&self) -> bool {
        !is_placeholder(&self.album)
    }

    /// Whether the song belongs to at least one playlist
    pub fn in_any_playlist(&self) -> bool {
        !self.playlists.is_empty()
    }

    /// Whether the song belongs to the given playlist
    pub fn in_playlist(&self, playlist: &PlaylistId) -> bool {
        self.playlists.contains(playlist)
    }
}

fn is_placeholder(name: &str) -> bool {
    let trimmed = name.trim().to_lowercase();
    PLACEHOLDER_NAMES.contains(&trimmed.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_names_are_unknown() {
        let mut song = Song::new("a.mp3", "A", "Unknown", "Unknown Album");
        assert!(!song.has_known_artist());
        assert!(!song.has_known_album());

        song.artist = "Real Band".to_string();
        assert!(song.has_known_artist());

        song.artist = "   ".to_string();
        assert!(!song.has_known_artist());
    }

    #[test]
    fn track_info_accepts_filename_alias() {
        let json = r#"{"filename": "a.mp3", "title": "A"}"#;
        let info: TrackInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.id.as_str(), "a.mp3");
        assert_eq!(info.artist, "");
    }
}
