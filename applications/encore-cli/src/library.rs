/// JSON-file collaborators
///
/// A library file holds both the scan results and the user's aggregates:
///
/// ```json
/// {
///   "tracks": [{ "id": "intro.mp3", "title": "Intro", "artist": "Band", "album": "LP" }],
///   "user": { "favorites": ["intro.mp3"], "play_counts": { "intro.mp3": 3 } }
/// }
/// ```
use encore_core::{
    CatalogSource, CoreError, KeyValueStore, TrackInfo, UserDataStore, UserLibraryData,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryFile {
    #[serde(default)]
    pub tracks: Vec<TrackInfo>,

    #[serde(default)]
    pub user: UserLibraryData,
}

/// Library file read once and served to the catalog loader
#[derive(Debug, Clone)]
pub struct JsonLibrary {
    path: PathBuf,
    contents: LibraryFile,
}

impl JsonLibrary {
    pub fn open(path: impl AsRef<Path>) -> encore_core::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path)?;
        let contents: LibraryFile = serde_json::from_str(&raw)?;

        tracing::debug!(
            "Read library {}: {} tracks, {} playlists",
            path.display(),
            contents.tracks.len(),
            contents.user.playlists.len()
        );
        Ok(Self { path, contents })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonLibrary {
    fn load_tracks(&self) -> encore_core::Result<Vec<TrackInfo>> {
        Ok(self.contents.tracks.clone())
    }
}

impl UserDataStore for JsonLibrary {
    fn load_user_data(&self) -> encore_core::Result<UserLibraryData> {
        Ok(self.contents.user.clone())
    }
}

/// Key-value store kept as one JSON object on disk
///
/// Every write rewrites the whole file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store; a missing file starts empty
    pub fn open(path: impl AsRef<Path>) -> encore_core::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> encore_core::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| CoreError::storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> encore_core::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CoreError::storage(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        std::fs::write(&self.path, serde_json::to_string_pretty(&*entries)?)?;
        Ok(())
    }
}
