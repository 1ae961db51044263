/// ID types for Encore entities
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Song identifier
///
/// Songs are keyed by their library filename, which stays stable across
/// catalog refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    /// Create a new song ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SongId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SongId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for SongId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Playlist identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    /// Create a new playlist ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlaylistId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlaylistId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
