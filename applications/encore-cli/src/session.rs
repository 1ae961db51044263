/// Engine construction and the listening-session simulation
use crate::settings::CliSettings;
use anyhow::Context;
use encore_core::{Catalog, KeyValueStore, PlaylistId, Song, SongId};
use encore_playback::config::SHUFFLE_CONFIG_KEY;
use encore_playback::{
    Personality, PlaybackCoordinator, QueueManager, QueueState, RecordingOutput, ShuffleConfig,
    ShuffleConfigStore,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Store key for the queue left behind by the last simulation
pub const QUEUE_STATE_KEY: &str = "queue_state";

/// Pick the shuffle config for this run
///
/// A saved config wins over the settings file; `requested` replaces the
/// personality bundle and, with a store, is saved for next time.
pub fn resolve_config(
    settings: &CliSettings,
    store: Option<&dyn KeyValueStore>,
    requested: Option<Personality>,
) -> anyhow::Result<ShuffleConfig> {
    let saved = match store {
        Some(kv) if kv.get(SHUFFLE_CONFIG_KEY)?.is_some() => Some(
            ShuffleConfigStore::new(kv)
                .load()
                .context("Saved shuffle config is unusable")?,
        ),
        _ => None,
    };
    let mut config = saved.unwrap_or_else(|| ShuffleConfig::for_personality(settings.personality));

    if let Some(personality) = requested {
        config = config.with_personality(personality);
        if let Some(kv) = store {
            ShuffleConfigStore::new(kv).save(&config)?;
        }
    }
    Ok(config)
}

/// Songs a shuffle draws from: one playlist, or the whole catalog
pub fn shuffle_scope(
    catalog: &Catalog,
    playlist: Option<&PlaylistId>,
) -> anyhow::Result<(Vec<Arc<Song>>, bool)> {
    match playlist {
        Some(id) => {
            let songs = catalog
                .playlist_songs(id)
                .with_context(|| format!("No playlist '{id}' in library"))?;
            Ok((songs, true))
        }
        None => Ok((catalog.songs().to_vec(), false)),
    }
}

/// Queue manager over `catalog`, configured from settings
pub fn build_manager(
    settings: &CliSettings,
    catalog: Catalog,
    config: ShuffleConfig,
    seed: Option<u64>,
) -> QueueManager {
    let mut engine = settings.engine.clone();
    if seed.is_some() {
        engine.rng_seed = seed;
    }
    QueueManager::new(catalog, config, engine)
}

/// Played sequence and how well it kept repeats apart
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub played: Vec<SongId>,

    /// Anti-repeat window at the end of the session
    pub window: usize,

    /// Distinct songs heard
    pub distinct: usize,

    /// Smallest number of plays between two plays of the same song
    pub min_gap: Option<usize>,

    /// Replays that came back inside the window
    pub early_repeats: usize,

    /// Queue at the end of the session
    pub final_state: QueueState,
}

impl SimulationReport {
    fn analyze(played: Vec<SongId>, window: usize, final_state: QueueState) -> Self {
        let mut last_seen: HashMap<&SongId, usize> = HashMap::new();
        let mut min_gap: Option<usize> = None;
        let mut early_repeats = 0;

        for (step, id) in played.iter().enumerate() {
            if let Some(previous) = last_seen.insert(id, step) {
                let gap = step - previous;
                min_gap = Some(min_gap.map_or(gap, |g| g.min(gap)));
                if gap <= window {
                    early_repeats += 1;
                }
            }
        }

        let distinct = last_seen.len();
        Self {
            played,
            window,
            distinct,
            min_gap,
            early_repeats,
            final_state,
        }
    }
}

/// Run `plays` tracks through a coordinator, completing each one
///
/// Starts from `resume` when given, otherwise from a fresh shuffle of
/// `scope`.
pub fn simulate(
    manager: QueueManager,
    scope: &[Arc<Song>],
    is_restricted: bool,
    plays: usize,
    resume: Option<QueueState>,
) -> anyhow::Result<SimulationReport> {
    let output = RecordingOutput::new();
    let mut coordinator = PlaybackCoordinator::new(manager, Box::new(output.clone()));

    let resumed = match resume {
        Some(state) => {
            let skipped = coordinator.restore_state(state)?;
            if skipped > 0 {
                tracing::warn!("{} saved entries are no longer in the library", skipped);
            }
            coordinator.play().is_ok()
        }
        None => false,
    };
    if !resumed {
        coordinator
            .shuffle_and_play(scope, is_restricted)
            .context("Nothing to play")?;
    }

    for _ in 1..plays {
        coordinator.on_track_completed()?;
        coordinator.poll_timers();
        coordinator.drain_events();
    }

    let window = coordinator.manager().tracker().window();
    let final_state = coordinator.export_state();
    Ok(SimulationReport::analyze(output.loaded(), window, final_state))
}

/// Save the final queue so the next run can pick it up
pub fn save_queue(store: &dyn KeyValueStore, state: &QueueState) -> anyhow::Result<()> {
    store.set(QUEUE_STATE_KEY, &serde_json::to_string(state)?)?;
    Ok(())
}

/// Load a saved queue, if any
pub fn load_queue(store: &dyn KeyValueStore) -> anyhow::Result<Option<QueueState>> {
    store
        .get(QUEUE_STATE_KEY)?
        .map(|raw| serde_json::from_str(&raw).context("Saved queue is unreadable"))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::{MemoryStore, Playlist, TrackInfo, UserLibraryData};

    fn create_catalog(n: usize) -> Catalog {
        let tracks = (0..n)
            .map(|i| {
                TrackInfo::new(format!("t{i}.mp3"), format!("T{i}"), format!("A{}", i % 4), "LP")
            })
            .collect();
        let user = UserLibraryData {
            playlists: vec![Playlist {
                id: "chill".into(),
                name: "Chill".into(),
                songs: vec!["t1.mp3".into(), "t2.mp3".into(), "t3.mp3".into()],
            }],
            ..Default::default()
        };
        Catalog::assemble(tracks, &user)
    }

    fn seeded_settings() -> CliSettings {
        let mut settings = CliSettings::default();
        settings.engine.rng_seed = Some(5);
        settings
    }

    #[test]
    fn requested_personality_is_saved() {
        let store = MemoryStore::new();
        let settings = CliSettings::default();

        let config = resolve_config(&settings, Some(&store), Some(Personality::Explorer)).unwrap();
        assert_eq!(config.personality(), Personality::Explorer);

        let again = resolve_config(&settings, Some(&store), None).unwrap();
        assert_eq!(again.personality(), Personality::Explorer);
    }

    #[test]
    fn settings_personality_applies_without_saved_config() {
        let mut settings = CliSettings::default();
        settings.personality = Personality::Consistent;

        let config = resolve_config(&settings, None, None).unwrap();
        assert_eq!(config.personality(), Personality::Consistent);
    }

    #[test]
    fn unknown_playlist_is_reported() {
        let catalog = create_catalog(5);
        assert!(shuffle_scope(&catalog, Some(&"nope".into())).is_err());

        let (songs, restricted) = shuffle_scope(&catalog, Some(&"chill".into())).unwrap();
        assert_eq!(songs.len(), 3);
        assert!(restricted);
    }

    #[test]
    fn simulation_keeps_repeats_outside_window() {
        let settings = seeded_settings();
        let catalog = create_catalog(30);
        let scope = catalog.songs().to_vec();
        let manager = build_manager(&settings, catalog, ShuffleConfig::default(), None);

        let report = simulate(manager, &scope, false, 120, None).unwrap();

        assert_eq!(report.played.len(), 120);
        assert_eq!(report.early_repeats, 0);
        assert_eq!(report.distinct, 30);
        assert!(report.min_gap.unwrap() > report.window);
    }

    #[test]
    fn restricted_simulation_stays_in_playlist() {
        let settings = seeded_settings();
        let catalog = create_catalog(10);
        let (scope, restricted) = shuffle_scope(&catalog, Some(&"chill".into())).unwrap();
        let manager = build_manager(&settings, catalog, ShuffleConfig::default(), None);

        let report = simulate(manager, &scope, restricted, 12, None).unwrap();
        let allowed = ["t1.mp3", "t2.mp3", "t3.mp3"];
        assert!(report.played.iter().all(|id| allowed.contains(&id.as_str())));
    }

    #[test]
    fn resume_continues_saved_queue() {
        let settings = seeded_settings();
        let store = MemoryStore::new();
        let catalog = create_catalog(8);
        let scope = catalog.songs().to_vec();

        let first = simulate(
            build_manager(&settings, catalog.clone(), ShuffleConfig::default(), None),
            &scope,
            false,
            3,
            None,
        )
        .unwrap();
        save_queue(&store, &first.final_state).unwrap();

        let saved = load_queue(&store).unwrap().unwrap();
        let second = simulate(
            build_manager(&settings, catalog, ShuffleConfig::default(), None),
            &scope,
            false,
            1,
            Some(saved),
        )
        .unwrap();

        assert_eq!(second.played[0], first.played[2]);
    }
}
