/// Collaborator traits for Encore
///
/// The playback engine consumes snapshots produced by these collaborators.
/// Implementations may do file or database I/O; the engine never calls them
/// from inside a queue mutation.
use crate::error::Result;
use crate::types::{Catalog, TrackInfo, UserLibraryData};

/// Supplies the track listing (library scan results)
pub trait CatalogSource {
    /// Load every available track
    ///
    /// # Errors
    /// Returns an error if the listing cannot be read
    fn load_tracks(&self) -> Result<Vec<TrackInfo>>;
}

/// Supplies per-user aggregates (favorites, play counts, playlists)
pub trait UserDataStore {
    /// Load the current user's library data
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    fn load_user_data(&self) -> Result<UserLibraryData>;
}

/// Flat string key-value store used to persist settings
pub trait KeyValueStore {
    /// Read a value, `None` if the key was never written
    ///
    /// # Errors
    /// Returns an error if the backing store fails
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    ///
    /// # Errors
    /// Returns an error if the backing store fails
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Load a fresh catalog snapshot from both collaborators
///
/// # Errors
/// Propagates the first collaborator failure
pub fn load_catalog(
    source: &dyn CatalogSource,
    user_data: &dyn UserDataStore,
) -> Result<Catalog> {
    let tracks = source.load_tracks()?;
    let data = user_data.load_user_data()?;
    tracing::debug!(
        "Assembling catalog: {} tracks, {} favorites, {} playlists",
        tracks.len(),
        data.favorites.len(),
        data.playlists.len()
    );
    Ok(Catalog::assemble(tracks, &data))
}
