//! CLI composition tests
//!
//! Settings file, library file and state file on disk, wired together the
//! way the binary does it.

use encore_cli::{
    build_manager, load_queue, resolve_config, save_queue, shuffle_scope, simulate, CliSettings,
    JsonFileStore, JsonLibrary,
};
use encore_core::{load_catalog, KeyValueStore, PlaylistId};
use encore_playback::Personality;
use std::path::Path;
use tempfile::TempDir;

// ===== Test Helpers =====

fn write_library(dir: &Path, n: usize) -> std::path::PathBuf {
    let tracks: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "id": format!("track{i}.flac"),
                "title": format!("Track {i}"),
                "artist": format!("Artist {}", i % 6),
                "album": format!("Album {}", i % 9),
            })
        })
        .collect();
    let library = serde_json::json!({
        "tracks": tracks,
        "user": {
            "favorites": ["track0.flac", "track1.flac"],
            "play_counts": { "track2.flac": 40, "track3.flac": 12 },
            "playlists": [
                { "id": "road", "name": "Road Trip", "songs": ["track4.flac", "track5.flac", "track6.flac", "track7.flac"] }
            ]
        }
    });

    let path = dir.join("library.json");
    std::fs::write(&path, serde_json::to_string_pretty(&library).unwrap()).unwrap();
    path
}

fn write_settings(dir: &Path, library: &Path) -> std::path::PathBuf {
    let state = dir.join("state.json");
    let contents = format!(
        "library_path = {:?}\nstate_path = {:?}\npersonality = \"explorer\"\n\n[engine]\nrng_seed = 11\n",
        library.display().to_string(),
        state.display().to_string()
    );
    let path = dir.join("encore.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

fn setup(n: usize) -> (TempDir, CliSettings) {
    let dir = TempDir::new().unwrap();
    let library = write_library(dir.path(), n);
    let config = write_settings(dir.path(), &library);
    let settings = CliSettings::load(Some(&config)).unwrap();
    (dir, settings)
}

// ===== Tests =====

#[test]
fn test_settings_point_at_files() {
    let (dir, settings) = setup(10);
    assert_eq!(settings.library_path, dir.path().join("library.json"));
    assert_eq!(settings.state_path, Some(dir.path().join("state.json")));
    assert_eq!(settings.personality, Personality::Explorer);
    assert_eq!(settings.engine.rng_seed, Some(11));
}

#[test]
fn test_playlist_shuffle_from_library_file() {
    let (_dir, settings) = setup(20);
    let library = JsonLibrary::open(&settings.library_path).unwrap();
    let catalog = load_catalog(&library, &library).unwrap();
    let config = resolve_config(&settings, None, None).unwrap();

    let road = PlaylistId::new("road");
    let (songs, restricted) = shuffle_scope(&catalog, Some(&road)).unwrap();
    let mut manager = build_manager(&settings, catalog, config, None);
    manager.shuffle_and_play(&songs, restricted).unwrap();

    assert_eq!(manager.queue().len(), 4);
    assert!(manager
        .queue()
        .items()
        .iter()
        .all(|item| item.song.in_playlist(&road)));
}

#[test]
fn test_state_file_round_trip() {
    let (_dir, settings) = setup(15);
    let state_path = settings.state_path.clone().unwrap();
    let library = JsonLibrary::open(&settings.library_path).unwrap();
    let catalog = load_catalog(&library, &library).unwrap();

    let report = {
        let store = JsonFileStore::open(&state_path).unwrap();
        let kv: &dyn KeyValueStore = &store;
        let config = resolve_config(&settings, Some(kv), Some(Personality::Consistent)).unwrap();
        let scope = catalog.songs().to_vec();
        let manager = build_manager(&settings, catalog.clone(), config, None);

        let report = simulate(manager, &scope, false, 25, None).unwrap();
        save_queue(kv, &report.final_state).unwrap();
        report
    };
    assert_eq!(report.played.len(), 25);
    assert_eq!(report.early_repeats, 0);

    let store = JsonFileStore::open(&state_path).unwrap();
    let kv: &dyn KeyValueStore = &store;
    let config = resolve_config(&settings, Some(kv), None).unwrap();
    assert_eq!(config.personality(), Personality::Consistent);

    let saved = load_queue(kv).unwrap().unwrap();
    assert_eq!(saved, report.final_state);
}
