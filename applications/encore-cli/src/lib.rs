//! Encore CLI Library
//!
//! Composition root for the playback engine: layered settings, JSON-file
//! collaborators, and a headless listening-session simulation.
//!
//! This library exposes the pieces the binary wires together so they can be
//! tested on their own.

pub mod library;
pub mod session;
pub mod settings;

pub use library::{JsonFileStore, JsonLibrary, LibraryFile};
pub use session::{
    build_manager, load_queue, resolve_config, save_queue, shuffle_scope, simulate,
    SimulationReport,
};
pub use settings::CliSettings;
