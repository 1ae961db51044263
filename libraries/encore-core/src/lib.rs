//! Encore Core
//!
//! Shared domain types, collaborator traits, and error handling for Encore.
//!
//! The playback engine never reads files or talks to a database itself. It
//! receives a [`Catalog`] snapshot assembled from two collaborators:
//! - **Track listing** ([`CatalogSource`]): what songs exist
//! - **User data** ([`UserDataStore`]): favorites, suggest-less flags, play counts, playlists
//!
//! Settings persistence goes through a plain [`KeyValueStore`].
//!
//! # Example
//!
//! ```rust
//! use encore_core::{Catalog, TrackInfo, UserLibraryData};
//!
//! let tracks = vec![
//!     TrackInfo::new("intro.mp3", "Intro", "Band", "First Album"),
//!     TrackInfo::new("outro.mp3", "Outro", "Band", "First Album"),
//! ];
//!
//! let mut user_data = UserLibraryData::default();
//! user_data.favorites.insert("intro.mp3".into());
//!
//! let catalog = Catalog::assemble(tracks, &user_data);
//! assert_eq!(catalog.len(), 2);
//! assert!(catalog.get(&"intro.mp3".into()).unwrap().is_favorite);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use storage::MemoryStore;
pub use traits::{load_catalog, CatalogSource, KeyValueStore, UserDataStore};
pub use types::{Catalog, Playlist, PlaylistId, Song, SongId, TrackInfo, UserLibraryData};
