//! Shuffle configuration
//!
//! `ShuffleConfig` is an immutable value. Changes go through
//! [`ShuffleConfig::copy_with`], which returns a new instance with every
//! weight clamped back into range, so a reader holding an `Arc<ShuffleConfig>`
//! never sees a half-applied update.

use crate::error::{PlaybackError, Result};
use encore_core::{KeyValueStore, PlaylistId};
use serde::{Deserialize, Serialize};

/// Lowest allowed weight (strongest penalty)
pub const WEIGHT_MIN: i32 = -99;

/// Highest allowed weight (strongest boost)
pub const WEIGHT_MAX: i32 = 99;

/// Multipliers are clamped into this range by `copy_with`
pub const MULTIPLIER_RANGE: (f64, f64) = (0.01, 100.0);

/// Largest accepted anti-repeat history limit
pub const HISTORY_LIMIT_MAX: usize = 500;

/// Key under which the serialized config is persisted
pub const SHUFFLE_CONFIG_KEY: &str = "shuffle_config";

/// Named preset of shuffle weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Favorites slightly boosted, recent songs and streaks avoided
    #[default]
    Default,

    /// Rare and unplayed songs strongly preferred
    Explorer,

    /// Favorites, playlists and well-loved songs preferred
    Consistent,
}

/// Weight bundle applied when a personality is selected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonalityBundle {
    pub avoid_repeating_songs: bool,
    pub avoid_repeating_artists: bool,
    pub avoid_repeating_albums: bool,
    pub anti_repeat_enabled: bool,
    pub streak_breaker_enabled: bool,
    pub least_played_weight: i32,
    pub most_played_weight: i32,
    pub favorites_weight: i32,
    pub suggest_less_weight: i32,
    pub playlist_songs_weight: i32,
    pub favorite_multiplier: f64,
    pub suggest_less_multiplier: f64,
}

struct PersonalityEntry {
    label: &'static str,
    description: &'static str,
    bundle: PersonalityBundle,
}

/// Indexed by `Personality as usize`
const PERSONALITY_TABLE: [PersonalityEntry; 3] = [
    PersonalityEntry {
        label: "Default",
        description: "Balanced shuffle that favors your favorites and avoids recent repeats",
        bundle: PersonalityBundle {
            avoid_repeating_songs: true,
            avoid_repeating_artists: false,
            avoid_repeating_albums: false,
            anti_repeat_enabled: true,
            streak_breaker_enabled: true,
            least_played_weight: 0,
            most_played_weight: 0,
            favorites_weight: 0,
            suggest_less_weight: 0,
            playlist_songs_weight: 0,
            favorite_multiplier: 1.15,
            suggest_less_multiplier: 0.2,
        },
    },
    PersonalityEntry {
        label: "Explorer",
        description: "Digs up songs you rarely or never play",
        bundle: PersonalityBundle {
            avoid_repeating_songs: true,
            avoid_repeating_artists: true,
            avoid_repeating_albums: false,
            anti_repeat_enabled: true,
            streak_breaker_enabled: true,
            least_played_weight: 80,
            most_played_weight: -40,
            favorites_weight: 0,
            suggest_less_weight: 0,
            playlist_songs_weight: 0,
            favorite_multiplier: 1.1,
            suggest_less_multiplier: 0.1,
        },
    },
    PersonalityEntry {
        label: "Consistent",
        description: "Sticks to favorites, playlists and the songs you play most",
        bundle: PersonalityBundle {
            avoid_repeating_songs: true,
            avoid_repeating_artists: false,
            avoid_repeating_albums: false,
            anti_repeat_enabled: true,
            streak_breaker_enabled: false,
            least_played_weight: -20,
            most_played_weight: 50,
            favorites_weight: 0,
            suggest_less_weight: 0,
            playlist_songs_weight: 80,
            favorite_multiplier: 3.0,
            suggest_less_multiplier: 0.2,
        },
    },
];

impl Personality {
    /// Every personality, in display order
    pub const ALL: [Personality; 3] = [
        Personality::Default,
        Personality::Explorer,
        Personality::Consistent,
    ];

    fn entry(self) -> &'static PersonalityEntry {
        &PERSONALITY_TABLE[self as usize]
    }

    /// Weight bundle for this personality
    pub fn bundle(self) -> &'static PersonalityBundle {
        &self.entry().bundle
    }

    /// Display label
    pub fn label(self) -> &'static str {
        self.entry().label
    }

    /// One-line description
    pub fn description(self) -> &'static str {
        self.entry().description
    }
}

impl std::str::FromStr for Personality {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Personality::Default),
            "explorer" => Ok(Personality::Explorer),
            "consistent" => Ok(Personality::Consistent),
            other => Err(PlaybackError::invalid_config(format!(
                "unknown personality '{other}'"
            ))),
        }
    }
}

/// Field overrides for [`ShuffleConfig::copy_with`]
///
/// `None` keeps the current value. When `personality` is set, its bundle is
/// applied first and the remaining overrides on top of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShuffleOverrides {
    pub personality: Option<Personality>,
    pub avoid_repeating_songs: Option<bool>,
    pub avoid_repeating_artists: Option<bool>,
    pub avoid_repeating_albums: Option<bool>,
    pub anti_repeat_enabled: Option<bool>,
    pub streak_breaker_enabled: Option<bool>,
    pub least_played_weight: Option<i32>,
    pub most_played_weight: Option<i32>,
    pub favorites_weight: Option<i32>,
    pub suggest_less_weight: Option<i32>,
    pub playlist_songs_weight: Option<i32>,
    pub favorite_multiplier: Option<f64>,
    pub suggest_less_multiplier: Option<f64>,
    pub history_limit: Option<usize>,
    pub consistent_playlists: Option<Vec<PlaylistId>>,
}

/// Flat serialized form of [`ShuffleConfig`]
///
/// This is what the settings store persists. It carries no invariants;
/// [`ShuffleConfig::from_record`] validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShuffleConfigRecord {
    pub personality: Personality,
    pub avoid_repeating_songs: bool,
    pub avoid_repeating_artists: bool,
    pub avoid_repeating_albums: bool,
    pub anti_repeat_enabled: bool,
    pub streak_breaker_enabled: bool,
    pub least_played_weight: i32,
    pub most_played_weight: i32,
    pub favorites_weight: i32,
    pub suggest_less_weight: i32,
    pub playlist_songs_weight: i32,
    pub favorite_multiplier: f64,
    pub suggest_less_multiplier: f64,
    pub history_limit: usize,
    pub consistent_playlists: Vec<PlaylistId>,
}

impl Default for ShuffleConfigRecord {
    fn default() -> Self {
        ShuffleConfig::default().to_record()
    }
}

/// Immutable shuffle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ShuffleConfigRecord", try_from = "ShuffleConfigRecord")]
pub struct ShuffleConfig {
    personality: Personality,
    avoid_repeating_songs: bool,
    avoid_repeating_artists: bool,
    avoid_repeating_albums: bool,
    anti_repeat_enabled: bool,
    streak_breaker_enabled: bool,
    least_played_weight: i32,
    most_played_weight: i32,
    favorites_weight: i32,
    suggest_less_weight: i32,
    playlist_songs_weight: i32,
    favorite_multiplier: f64,
    suggest_less_multiplier: f64,
    history_limit: usize,
    consistent_playlists: Vec<PlaylistId>,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self::for_personality(Personality::Default)
    }
}

impl ShuffleConfig {
    /// Fresh configuration from a personality preset
    pub fn for_personality(personality: Personality) -> Self {
        let bundle = personality.bundle();
        Self {
            personality,
            avoid_repeating_songs: bundle.avoid_repeating_songs,
            avoid_repeating_artists: bundle.avoid_repeating_artists,
            avoid_repeating_albums: bundle.avoid_repeating_albums,
            anti_repeat_enabled: bundle.anti_repeat_enabled,
            streak_breaker_enabled: bundle.streak_breaker_enabled,
            least_played_weight: bundle.least_played_weight,
            most_played_weight: bundle.most_played_weight,
            favorites_weight: bundle.favorites_weight,
            suggest_less_weight: bundle.suggest_less_weight,
            playlist_songs_weight: bundle.playlist_songs_weight,
            favorite_multiplier: bundle.favorite_multiplier,
            suggest_less_multiplier: bundle.suggest_less_multiplier,
            history_limit: 50,
            consistent_playlists: Vec::new(),
        }
    }

    /// New instance with `overrides` applied and every field re-clamped
    ///
    /// Out-of-range weights are clamped to [-99, 99], multipliers to
    /// [`MULTIPLIER_RANGE`], and the history limit to 1..=500. Non-finite
    /// multipliers are ignored.
    pub fn copy_with(&self, overrides: ShuffleOverrides) -> Self {
        let mut next = match overrides.personality {
            Some(personality) => Self {
                history_limit: self.history_limit,
                consistent_playlists: self.consistent_playlists.clone(),
                ..Self::for_personality(personality)
            },
            None => self.clone(),
        };

        if let Some(v) = overrides.avoid_repeating_songs {
            next.avoid_repeating_songs = v;
        }
        if let Some(v) = overrides.avoid_repeating_artists {
            next.avoid_repeating_artists = v;
        }
        if let Some(v) = overrides.avoid_repeating_albums {
            next.avoid_repeating_albums = v;
        }
        if let Some(v) = overrides.anti_repeat_enabled {
            next.anti_repeat_enabled = v;
        }
        if let Some(v) = overrides.streak_breaker_enabled {
            next.streak_breaker_enabled = v;
        }
        if let Some(v) = overrides.least_played_weight {
            next.least_played_weight = clamp_weight(v);
        }
        if let Some(v) = overrides.most_played_weight {
            next.most_played_weight = clamp_weight(v);
        }
        if let Some(v) = overrides.favorites_weight {
            next.favorites_weight = clamp_weight(v);
        }
        if let Some(v) = overrides.suggest_less_weight {
            next.suggest_less_weight = clamp_weight(v);
        }
        if let Some(v) = overrides.playlist_songs_weight {
            next.playlist_songs_weight = clamp_weight(v);
        }
        if let Some(v) = overrides.favorite_multiplier.filter(|v| v.is_finite()) {
            next.favorite_multiplier = clamp_multiplier(v);
        }
        if let Some(v) = overrides.suggest_less_multiplier.filter(|v| v.is_finite()) {
            next.suggest_less_multiplier = clamp_multiplier(v);
        }
        if let Some(v) = overrides.history_limit {
            next.history_limit = v.clamp(1, HISTORY_LIMIT_MAX);
        }
        if let Some(v) = overrides.consistent_playlists {
            next.consistent_playlists = v;
        }

        next
    }

    /// Same settings with a different personality bundle
    pub fn with_personality(&self, personality: Personality) -> Self {
        self.copy_with(ShuffleOverrides {
            personality: Some(personality),
            ..Default::default()
        })
    }

    /// Validate a deserialized record
    ///
    /// Unlike `copy_with`, this rejects out-of-domain values instead of
    /// clamping them: a bad record means the store or its writer is broken.
    pub fn from_record(record: ShuffleConfigRecord) -> Result<Self> {
        let weights = [
            ("leastPlayedWeight", record.least_played_weight),
            ("mostPlayedWeight", record.most_played_weight),
            ("favoritesWeight", record.favorites_weight),
            ("suggestLessWeight", record.suggest_less_weight),
            ("playlistSongsWeight", record.playlist_songs_weight),
        ];
        for (name, value) in weights {
            if !(WEIGHT_MIN..=WEIGHT_MAX).contains(&value) {
                return Err(PlaybackError::invalid_config(format!(
                    "{name} = {value} is outside [{WEIGHT_MIN}, {WEIGHT_MAX}]"
                )));
            }
        }

        let multipliers = [
            ("favoriteMultiplier", record.favorite_multiplier),
            ("suggestLessMultiplier", record.suggest_less_multiplier),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlaybackError::invalid_config(format!(
                    "{name} = {value} must be a positive number"
                )));
            }
        }

        if record.history_limit == 0 || record.history_limit > HISTORY_LIMIT_MAX {
            return Err(PlaybackError::invalid_config(format!(
                "historyLimit = {} is outside [1, {HISTORY_LIMIT_MAX}]",
                record.history_limit
            )));
        }

        Ok(Self {
            personality: record.personality,
            avoid_repeating_songs: record.avoid_repeating_songs,
            avoid_repeating_artists: record.avoid_repeating_artists,
            avoid_repeating_albums: record.avoid_repeating_albums,
            anti_repeat_enabled: record.anti_repeat_enabled,
            streak_breaker_enabled: record.streak_breaker_enabled,
            least_played_weight: record.least_played_weight,
            most_played_weight: record.most_played_weight,
            favorites_weight: record.favorites_weight,
            suggest_less_weight: record.suggest_less_weight,
            playlist_songs_weight: record.playlist_songs_weight,
            favorite_multiplier: record.favorite_multiplier,
            suggest_less_multiplier: record.suggest_less_multiplier,
            history_limit: record.history_limit,
            consistent_playlists: record.consistent_playlists,
        })
    }

    /// Flat record for persistence
    pub fn to_record(&self) -> ShuffleConfigRecord {
        ShuffleConfigRecord {
            personality: self.personality,
            avoid_repeating_songs: self.avoid_repeating_songs,
            avoid_repeating_artists: self.avoid_repeating_artists,
            avoid_repeating_albums: self.avoid_repeating_albums,
            anti_repeat_enabled: self.anti_repeat_enabled,
            streak_breaker_enabled: self.streak_breaker_enabled,
            least_played_weight: self.least_played_weight,
            most_played_weight: self.most_played_weight,
            favorites_weight: self.favorites_weight,
            suggest_less_weight: self.suggest_less_weight,
            playlist_songs_weight: self.playlist_songs_weight,
            favorite_multiplier: self.favorite_multiplier,
            suggest_less_multiplier: self.suggest_less_multiplier,
            history_limit: self.history_limit,
            consistent_playlists: self.consistent_playlists.clone(),
        }
    }

    /// Check invariants on an already-built instance
    pub fn validate(&self) -> Result<()> {
        Self::from_record(self.to_record()).map(|_| ())
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn avoid_repeating_songs(&self) -> bool {
        self.avoid_repeating_songs
    }

    pub fn avoid_repeating_artists(&self) -> bool {
        self.avoid_repeating_artists
    }

    pub fn avoid_repeating_albums(&self) -> bool {
        self.avoid_repeating_albums
    }

    pub fn anti_repeat_enabled(&self) -> bool {
        self.anti_repeat_enabled
    }

    pub fn streak_breaker_enabled(&self) -> bool {
        self.streak_breaker_enabled
    }

    pub fn least_played_weight(&self) -> i32 {
        self.least_played_weight
    }

    pub fn most_played_weight(&self) -> i32 {
        self.most_played_weight
    }

    pub fn favorites_weight(&self) -> i32 {
        self.favorites_weight
    }

    pub fn suggest_less_weight(&self) -> i32 {
        self.suggest_less_weight
    }

    pub fn playlist_songs_weight(&self) -> i32 {
        self.playlist_songs_weight
    }

    pub fn favorite_multiplier(&self) -> f64 {
        self.favorite_multiplier
    }

    pub fn suggest_less_multiplier(&self) -> f64 {
        self.suggest_less_multiplier
    }

    /// Anti-repeat window cap
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Playlists counted by the playlist axis (empty = any playlist)
    pub fn consistent_playlists(&self) -> &[PlaylistId] {
        &self.consistent_playlists
    }
}

impl From<ShuffleConfig> for ShuffleConfigRecord {
    fn from(config: ShuffleConfig) -> Self {
        config.to_record()
    }
}

impl TryFrom<ShuffleConfigRecord> for ShuffleConfig {
    type Error = PlaybackError;

    fn try_from(record: ShuffleConfigRecord) -> Result<Self> {
        Self::from_record(record)
    }
}

fn clamp_weight(value: i32) -> i32 {
    value.clamp(WEIGHT_MIN, WEIGHT_MAX)
}

fn clamp_multiplier(value: f64) -> f64 {
    value.clamp(MULTIPLIER_RANGE.0, MULTIPLIER_RANGE.1)
}

/// Persists [`ShuffleConfig`] through a [`KeyValueStore`]
pub struct ShuffleConfigStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> ShuffleConfigStore<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Load the saved config, or the default if none was saved
    ///
    /// # Errors
    /// `InvalidConfig` if the stored record is out of domain,
    /// `Serialization` if it is not valid JSON
    pub fn load(&self) -> Result<ShuffleConfig> {
        match self.store.get(SHUFFLE_CONFIG_KEY)? {
            Some(raw) => {
                let record: ShuffleConfigRecord = serde_json::from_str(&raw)?;
                ShuffleConfig::from_record(record)
            }
            None => {
                tracing::debug!("No saved shuffle config, using defaults");
                Ok(ShuffleConfig::default())
            }
        }
    }

    /// Persist a config
    pub fn save(&self, config: &ShuffleConfig) -> Result<()> {
        let raw = serde_json::to_string(&config.to_record())?;
        self.store.set(SHUFFLE_CONFIG_KEY, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::MemoryStore;

    #[test]
    fn default_uses_default_personality() {
        let config = ShuffleConfig::default();
        assert_eq!(config.personality(), Personality::Default);
        assert_eq!(config.favorite_multiplier(), 1.15);
        assert_eq!(config.suggest_less_multiplier(), 0.2);
        assert!(config.avoid_repeating_songs());
        assert_eq!(config.history_limit(), 50);
    }

    #[test]
    fn copy_with_clamps_weights() {
        let config = ShuffleConfig::default().copy_with(ShuffleOverrides {
            least_played_weight: Some(250),
            most_played_weight: Some(-1000),
            favorites_weight: Some(42),
            ..Default::default()
        });

        assert_eq!(config.least_played_weight(), 99);
        assert_eq!(config.most_played_weight(), -99);
        assert_eq!(config.favorites_weight(), 42);
    }

    #[test]
    fn copy_with_keeps_multipliers_positive() {
        let base = ShuffleConfig::default();
        let config = base.copy_with(ShuffleOverrides {
            favorite_multiplier: Some(-3.0),
            suggest_less_multiplier: Some(f64::NAN),
            ..Default::default()
        });

        assert!(config.favorite_multiplier() > 0.0);
        assert_eq!(config.suggest_less_multiplier(), base.suggest_less_multiplier());
    }

    #[test]
    fn copy_with_leaves_original_untouched() {
        let base = ShuffleConfig::default();
        let _ = base.copy_with(ShuffleOverrides {
            playlist_songs_weight: Some(10),
            ..Default::default()
        });
        assert_eq!(base.playlist_songs_weight(), 0);
    }

    #[test]
    fn personality_overwrites_bundle_but_keeps_limits() {
        let base = ShuffleConfig::default().copy_with(ShuffleOverrides {
            least_played_weight: Some(5),
            history_limit: Some(20),
            consistent_playlists: Some(vec!["road".into()]),
            ..Default::default()
        });

        let explorer = base.with_personality(Personality::Explorer);
        assert_eq!(explorer.personality(), Personality::Explorer);
        assert_eq!(explorer.least_played_weight(), 80);
        assert_eq!(explorer.most_played_weight(), -40);
        assert!(explorer.avoid_repeating_artists());
        assert_eq!(explorer.history_limit(), 20);
        assert_eq!(explorer.consistent_playlists(), &[PlaylistId::from("road")]);
    }

    #[test]
    fn explicit_overrides_apply_on_top_of_personality() {
        let config = ShuffleConfig::default().copy_with(ShuffleOverrides {
            personality: Some(Personality::Consistent),
            playlist_songs_weight: Some(10),
            ..Default::default()
        });

        assert_eq!(config.personality(), Personality::Consistent);
        assert_eq!(config.playlist_songs_weight(), 10);
        assert_eq!(config.favorite_multiplier(), 3.0);
    }

    #[test]
    fn bundles_satisfy_invariants() {
        for personality in Personality::ALL {
            let config = ShuffleConfig::for_personality(personality);
            assert!(config.validate().is_ok(), "{personality:?}");
            assert!(!personality.label().is_empty());
            assert!(!personality.description().is_empty());
        }
    }

    #[test]
    fn from_record_rejects_out_of_range_weight() {
        let mut record = ShuffleConfig::default().to_record();
        record.favorites_weight = 150;

        let err = ShuffleConfig::from_record(record).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidConfig(_)));
    }

    #[test]
    fn from_record_rejects_non_positive_multiplier() {
        let mut record = ShuffleConfig::default().to_record();
        record.suggest_less_multiplier = 0.0;

        assert!(matches!(
            ShuffleConfig::from_record(record),
            Err(PlaybackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn record_uses_camel_case() {
        let json = serde_json::to_value(ShuffleConfig::default()).unwrap();
        assert!(json.get("leastPlayedWeight").is_some());
        assert!(json.get("avoidRepeatingSongs").is_some());
        assert_eq!(json["personality"], "default");
    }

    #[test]
    fn deserialize_rejects_bad_record() {
        let raw = r#"{"mostPlayedWeight": 500}"#;
        let result: std::result::Result<ShuffleConfig, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn parse_personality() {
        assert_eq!("Explorer".parse::<Personality>().unwrap(), Personality::Explorer);
        assert!("chaotic".parse::<Personality>().is_err());
    }

    #[test]
    fn store_round_trip_and_default() {
        let kv = MemoryStore::new();
        let store = ShuffleConfigStore::new(&kv);

        assert_eq!(store.load().unwrap(), ShuffleConfig::default());

        let config = ShuffleConfig::for_personality(Personality::Consistent);
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn store_reports_invalid_saved_record() {
        let kv = MemoryStore::new();
        kv.set(SHUFFLE_CONFIG_KEY, r#"{"favoriteMultiplier": -1.0}"#)
            .unwrap();

        let err = ShuffleConfigStore::new(&kv).load().unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidConfig(_)));
    }
}
