mod catalog;
mod ids;
mod song;

pub use catalog::{Catalog, Playlist, UserLibraryData};
pub use ids::{PlaylistId, SongId};
pub use song::{Song, TrackInfo};
