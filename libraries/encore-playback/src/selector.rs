//! Weighted random selection
//!
//! Each candidate starts at weight 1.0 and is scaled multiplicatively by
//! every active axis:
//!
//! 1. Favorite / suggest-less multipliers
//! 2. Least-played and most-played axes (relative to the scope's median)
//! 3. Playlist membership
//! 4. Soft anti-repeat penalty, decaying with recency rank
//! 5. Artist/album streak penalties against the last 1-2 plays
//!
//! The result is floored at [`EPSILON`] so no song ever drops to zero.
//! With `avoid_repeating_songs`, songs still inside the recency window are
//! filtered out before drawing (unless that would leave nothing).

use crate::anti_repeat::{name_key, AntiRepeatTracker};
use crate::config::{ShuffleConfig, WEIGHT_MAX};
use crate::error::{PlaybackError, Result};
use encore_core::{Song, SongId};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Smallest weight any candidate can end up with
pub const EPSILON: f64 = 1e-4;

/// Factor applied at full weight (+99 multiplies by this, -99 divides)
const AXIS_BASE: f64 = 4.0;

/// Strongest soft anti-repeat reduction (most recent play keeps 5%)
const ANTI_REPEAT_STRENGTH: f64 = 0.95;

const AVOID_ARTIST_FACTOR: f64 = 0.2;
const AVOID_ALBUM_FACTOR: f64 = 0.35;
const STREAK_ARTIST_FACTOR: f64 = 0.5;
const STREAK_ALBUM_FACTOR: f64 = 0.7;

/// Map a weight in [-99, 99] and a strength in [0, 1] to a multiplier
///
/// `AXIS_BASE ^ (weight / 99 * strength)`: 1.0 at weight 0 or strength 0,
/// bounded to [1/4, 4], strictly monotonic in both arguments when the
/// other is non-zero.
pub fn axis_factor(weight: i32, strength: f64) -> f64 {
    let exponent = f64::from(weight) / f64::from(WEIGHT_MAX) * strength.clamp(0.0, 1.0);
    AXIS_BASE.powf(exponent)
}

/// Play-count distribution of a scope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayCountStats {
    min: u32,
    median: f64,
    max: u32,
}

impl PlayCountStats {
    pub fn from_songs(songs: &[Arc<Song>]) -> Self {
        if songs.is_empty() {
            return Self {
                min: 0,
                median: 0.0,
                max: 0,
            };
        }

        let mut counts: Vec<u32> = songs.iter().map(|s| s.play_count).collect();
        counts.sort_unstable();

        let mid = counts.len() / 2;
        let median = if mid * 2 == counts.len() {
            (f64::from(counts[mid - 1]) + f64::from(counts[mid])) / 2.0
        } else {
            f64::from(counts[mid])
        };

        Self {
            min: counts[0],
            median,
            max: counts[counts.len() - 1],
        }
    }

    /// How far below the median, 0.0 (at or above) to 1.0 (the minimum)
    pub fn deficit(&self, play_count: u32) -> f64 {
        let span = self.median - f64::from(self.min);
        if span <= 0.0 {
            return 0.0;
        }
        ((self.median - f64::from(play_count)) / span).clamp(0.0, 1.0)
    }

    /// How far above the median, 0.0 (at or below) to 1.0 (the maximum)
    pub fn excess(&self, play_count: u32) -> f64 {
        let span = f64::from(self.max) - self.median;
        if span <= 0.0 {
            return 0.0;
        }
        ((f64::from(play_count) - self.median) / span).clamp(0.0, 1.0)
    }

    pub fn median(&self) -> f64 {
        self.median
    }
}

/// Weighted selector bound to one scope
///
/// Play-count statistics are computed once for the scope so repeated draws
/// (queue generation) do not re-sort it each time.
#[derive(Debug, Clone)]
pub struct WeightedSelector {
    stats: PlayCountStats,
}

impl WeightedSelector {
    pub fn new(scope: &[Arc<Song>]) -> Self {
        Self {
            stats: PlayCountStats::from_songs(scope),
        }
    }

    pub fn stats(&self) -> &PlayCountStats {
        &self.stats
    }

    /// Relative weight of one song
    pub fn weight(&self, song: &Song, config: &ShuffleConfig, tracker: &AntiRepeatTracker) -> f64 {
        let recency = recency_factor(
            config,
            tracker.window(),
            tracker.song_rank(&song.id),
            |depth| tracker.artist_in_last(song, depth),
            |depth| tracker.album_in_last(song, depth),
        );
        floor_weight(self.base_weight(song, config) * recency)
    }

    /// Part of the weight that does not depend on play history
    fn base_weight(&self, song: &Song, config: &ShuffleConfig) -> f64 {
        let mut weight = 1.0;

        if song.is_favorite {
            weight *= config.favorite_multiplier() * axis_factor(config.favorites_weight(), 1.0);
        }
        if song.is_suggest_less {
            weight *=
                config.suggest_less_multiplier() * axis_factor(config.suggest_less_weight(), 1.0);
        }

        if config.least_played_weight() != 0 {
            let deficit = self.stats.deficit(song.play_count);
            weight *= axis_factor(config.least_played_weight(), deficit);
        }
        if config.most_played_weight() != 0 {
            let excess = self.stats.excess(song.play_count);
            weight *= axis_factor(config.most_played_weight(), excess);
        }

        if config.playlist_songs_weight() != 0 && counts_as_playlist_song(song, config) {
            weight *= axis_factor(config.playlist_songs_weight(), 1.0);
        }
        weight
    }

    /// Draw one candidate, returning its index in `candidates`
    ///
    /// # Errors
    /// `EmptyCandidateSet` if `candidates` is empty
    pub fn select<R: Rng + ?Sized>(
        &self,
        candidates: &[Arc<Song>],
        config: &ShuffleConfig,
        tracker: &AntiRepeatTracker,
        rng: &mut R,
    ) -> Result<usize> {
        match candidates.len() {
            0 => return Err(PlaybackError::EmptyCandidateSet),
            1 => return Ok(0),
            _ => {}
        }

        CandidatePool::new(self, candidates.to_vec(), config).select(config, tracker, rng)
    }

    /// Draw up to `limit` songs from `pool` without replacement
    ///
    /// Every pick is recorded in `tracker`, so streak and anti-repeat
    /// penalties see the sequence being built. Pass a scratch tracker when
    /// the draws are not actual plays.
    pub fn draw_sequence<R: Rng + ?Sized>(
        &self,
        pool: Vec<Arc<Song>>,
        limit: usize,
        config: &ShuffleConfig,
        tracker: &mut AntiRepeatTracker,
        rng: &mut R,
    ) -> Result<Vec<Arc<Song>>> {
        if pool.is_empty() {
            return Err(PlaybackError::EmptyCandidateSet);
        }

        let mut pool = CandidatePool::new(self, pool, config);
        let mut drawn = Vec::with_capacity(limit.min(pool.len()));
        while drawn.len() < limit && !pool.is_empty() {
            let index = pool.select(config, tracker, rng)?;
            let song = pool.swap_remove(index);
            tracker.record_play(&song);
            drawn.push(song);
        }
        Ok(drawn)
    }
}

/// History-dependent multiplier: soft anti-repeat and artist/album streaks
///
/// `artist_in_last(depth)` and `album_in_last(depth)` answer whether the
/// song matches one of the last `depth` plays.
fn recency_factor(
    config: &ShuffleConfig,
    window: usize,
    rank: Option<usize>,
    artist_in_last: impl Fn(usize) -> bool,
    album_in_last: impl Fn(usize) -> bool,
) -> f64 {
    let mut factor = 1.0;

    if config.anti_repeat_enabled() {
        if let Some(rank) = rank {
            let freshness = 1.0 - (rank as f64 / window.max(1) as f64);
            factor *= 1.0 - ANTI_REPEAT_STRENGTH * freshness.clamp(0.0, 1.0);
        }
    }

    if config.avoid_repeating_artists() {
        if artist_in_last(2) {
            factor *= AVOID_ARTIST_FACTOR;
        }
    } else if config.streak_breaker_enabled() && artist_in_last(1) {
        factor *= STREAK_ARTIST_FACTOR;
    }

    if config.avoid_repeating_albums() {
        if album_in_last(2) {
            factor *= AVOID_ALBUM_FACTOR;
        }
    } else if config.streak_breaker_enabled() && album_in_last(1) {
        factor *= STREAK_ALBUM_FACTOR;
    }

    factor
}

fn floor_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.max(EPSILON)
    } else {
        EPSILON
    }
}

/// Per-candidate data that stays fixed across draws
#[derive(Debug, Clone, Copy)]
struct Entry {
    base: f64,
    song: usize,
    artist: Option<usize>,
    album: Option<usize>,
}

/// Candidates prepared for repeated draws under one config
///
/// Song ids and artist/album names are interned to integer keys when the
/// pool is built, so a draw compares integers and never lowercases or
/// hashes per candidate.
struct CandidatePool {
    songs: Vec<Arc<Song>>,
    entries: Vec<Entry>,
    song_keys: HashMap<SongId, usize>,
    artist_keys: HashMap<String, usize>,
    album_keys: HashMap<String, usize>,
}

/// Play history translated into the pool's keys
struct Recency {
    /// Recency rank by song key
    ranks: Vec<Option<usize>>,
    last: Option<usize>,
    window: usize,
    artists: Vec<Option<usize>>,
    albums: Vec<Option<usize>>,
}

impl CandidatePool {
    fn new(selector: &WeightedSelector, songs: Vec<Arc<Song>>, config: &ShuffleConfig) -> Self {
        let mut song_keys = HashMap::with_capacity(songs.len());
        let mut artist_keys = HashMap::new();
        let mut album_keys = HashMap::new();

        let entries = songs
            .iter()
            .map(|song| Entry {
                base: selector.base_weight(song, config),
                song: intern(&mut song_keys, &song.id),
                artist: song
                    .has_known_artist()
                    .then(|| intern(&mut artist_keys, &name_key(&song.artist))),
                album: song
                    .has_known_album()
                    .then(|| intern(&mut album_keys, &name_key(&song.album))),
            })
            .collect();

        Self {
            songs,
            entries,
            song_keys,
            artist_keys,
            album_keys,
        }
    }

    fn len(&self) -> usize {
        self.songs.len()
    }

    fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    fn swap_remove(&mut self, index: usize) -> Arc<Song> {
        self.entries.swap_remove(index);
        self.songs.swap_remove(index)
    }

    fn recency(&self, tracker: &AntiRepeatTracker) -> Recency {
        let mut ranks = vec![None; self.song_keys.len()];
        for (rank, id) in tracker.recent_songs().enumerate() {
            if let Some(&key) = self.song_keys.get(id) {
                ranks[key] = Some(rank);
            }
        }

        Recency {
            ranks,
            last: tracker
                .last_song()
                .and_then(|id| self.song_keys.get(id).copied()),
            window: tracker.window(),
            artists: tracker
                .recent_artists(2)
                .map(|name| name.and_then(|n| self.artist_keys.get(n).copied()))
                .collect(),
            albums: tracker
                .recent_albums(2)
                .map(|name| name.and_then(|n| self.album_keys.get(n).copied()))
                .collect(),
        }
    }

    fn select<R: Rng + ?Sized>(
        &self,
        config: &ShuffleConfig,
        tracker: &AntiRepeatTracker,
        rng: &mut R,
    ) -> Result<usize> {
        match self.len() {
            0 => return Err(PlaybackError::EmptyCandidateSet),
            1 => return Ok(0),
            _ => {}
        }

        let recency = self.recency(tracker);
        let pool = self.eligible(&recency, config);
        let weights: Vec<f64> = pool
            .iter()
            .map(|&i| {
                let entry = &self.entries[i];
                floor_weight(entry.base * recency.factor(entry, config))
            })
            .collect();

        let pick = draw_index(&weights, rng);
        tracing::trace!(
            "Selected {} from {} eligible of {} candidates",
            self.songs[pool[pick]].id,
            pool.len(),
            self.len()
        );
        Ok(pool[pick])
    }

    /// Indices allowed into the draw
    ///
    /// The song played last is never drawn again immediately. With
    /// `avoid_repeating_songs`, nothing inside the recency window is either.
    /// Falls back to a looser set instead of coming up empty.
    fn eligible(&self, recency: &Recency, config: &ShuffleConfig) -> Vec<usize> {
        if config.avoid_repeating_songs() {
            let fresh: Vec<usize> = (0..self.len())
                .filter(|&i| recency.ranks[self.entries[i].song].is_none())
                .collect();
            if !fresh.is_empty() {
                return fresh;
            }
        }

        if let Some(last) = recency.last {
            let not_last: Vec<usize> = (0..self.len())
                .filter(|&i| self.entries[i].song != last)
                .collect();
            if !not_last.is_empty() {
                return not_last;
            }
        }

        (0..self.len()).collect()
    }
}

impl Recency {
    fn factor(&self, entry: &Entry, config: &ShuffleConfig) -> f64 {
        recency_factor(
            config,
            self.window,
            self.ranks[entry.song],
            |depth| matches_recent(&self.artists, entry.artist, depth),
            |depth| matches_recent(&self.albums, entry.album, depth),
        )
    }
}

fn matches_recent(recent: &[Option<usize>], key: Option<usize>, depth: usize) -> bool {
    key.is_some() && recent.iter().take(depth).any(|k| *k == key)
}

fn intern<K, Q>(keys: &mut HashMap<K, usize>, value: &Q) -> usize
where
    K: std::borrow::Borrow<Q> + std::hash::Hash + Eq,
    Q: ToOwned<Owned = K> + std::hash::Hash + Eq + ?Sized,
{
    if let Some(&key) = keys.get(value) {
        return key;
    }
    let key = keys.len();
    keys.insert(value.to_owned(), key);
    key
}

fn counts_as_playlist_song(song: &Song, config: &ShuffleConfig) -> bool {
    let chosen = config.consistent_playlists();
    if chosen.is_empty() {
        song.in_any_playlist()
    } else {
        chosen.iter().any(|p| song.in_playlist(p))
    }
}

/// Cumulative-weight draw over a non-empty weight list
fn draw_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut total = 0.0;
    for w in weights {
        total += w;
        cumulative.push(total);
    }

    if !(total.is_finite() && total > 0.0) {
        return rng.gen_range(0..weights.len());
    }

    let target = rng.gen_range(0.0..total);
    cumulative
        .partition_point(|&c| c <= target)
        .min(weights.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShuffleOverrides;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_song(id: &str, artist: &str, plays: u32) -> Arc<Song> {
        let mut song = Song::new(id, id, artist, format!("{artist} LP"));
        song.play_count = plays;
        Arc::new(song)
    }

    fn neutral_config() -> ShuffleConfig {
        ShuffleConfig::default().copy_with(ShuffleOverrides {
            avoid_repeating_songs: Some(false),
            anti_repeat_enabled: Some(false),
            streak_breaker_enabled: Some(false),
            ..Default::default()
        })
    }

    #[test]
    fn axis_factor_is_bounded_and_neutral_at_zero() {
        assert_eq!(axis_factor(0, 1.0), 1.0);
        assert_eq!(axis_factor(50, 0.0), 1.0);
        assert!((axis_factor(99, 1.0) - 4.0).abs() < 1e-12);
        assert!((axis_factor(-99, 1.0) - 0.25).abs() < 1e-12);
        assert!(axis_factor(40, 1.0) > axis_factor(20, 1.0));
    }

    #[test]
    fn stats_median_and_normalization() {
        let songs = vec![
            create_test_song("a", "A", 0),
            create_test_song("b", "B", 10),
            create_test_song("c", "C", 20),
            create_test_song("d", "D", 100),
        ];
        let stats = PlayCountStats::from_songs(&songs);

        assert_eq!(stats.median(), 15.0);
        assert_eq!(stats.deficit(0), 1.0);
        assert_eq!(stats.deficit(20), 0.0);
        assert_eq!(stats.excess(100), 1.0);
        assert_eq!(stats.excess(10), 0.0);
    }

    #[test]
    fn least_played_weight_prefers_rare_songs() {
        let songs = vec![
            create_test_song("rare", "A", 0),
            create_test_song("mid", "B", 10),
            create_test_song("hot", "C", 50),
        ];
        let selector = WeightedSelector::new(&songs);
        let tracker = AntiRepeatTracker::new(3);
        let config = neutral_config().copy_with(ShuffleOverrides {
            least_played_weight: Some(60),
            ..Default::default()
        });

        let rare = selector.weight(&songs[0], &config, &tracker);
        let mid = selector.weight(&songs[1], &config, &tracker);
        let hot = selector.weight(&songs[2], &config, &tracker);
        assert!(rare > mid);
        assert_eq!(mid, hot);
    }

    #[test]
    fn most_played_weight_prefers_popular_songs() {
        let songs = vec![
            create_test_song("rare", "A", 0),
            create_test_song("mid", "B", 10),
            create_test_song("hot", "C", 50),
        ];
        let selector = WeightedSelector::new(&songs);
        let tracker = AntiRepeatTracker::new(3);
        let config = neutral_config().copy_with(ShuffleOverrides {
            most_played_weight: Some(60),
            ..Default::default()
        });

        assert!(
            selector.weight(&songs[2], &config, &tracker)
                > selector.weight(&songs[1], &config, &tracker)
        );
    }

    #[test]
    fn favorite_and_suggest_less_multipliers() {
        let mut fav = Song::new("fav", "Fav", "A", "X");
        fav.is_favorite = true;
        let mut meh = Song::new("meh", "Meh", "B", "Y");
        meh.is_suggest_less = true;

        let selector = WeightedSelector::new(&[]);
        let tracker = AntiRepeatTracker::new(3);
        let config = neutral_config();

        assert!((selector.weight(&fav, &config, &tracker) - 1.15).abs() < 1e-12);
        assert!((selector.weight(&meh, &config, &tracker) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn playlist_axis_respects_consistent_playlists() {
        let mut road = Song::new("road", "Road", "A", "X");
        road.playlists.insert("road-trip".into());
        let mut gym = Song::new("gym", "Gym", "B", "Y");
        gym.playlists.insert("gym".into());

        let selector = WeightedSelector::new(&[]);
        let tracker = AntiRepeatTracker::new(3);
        let any = neutral_config().copy_with(ShuffleOverrides {
            playlist_songs_weight: Some(99),
            ..Default::default()
        });
        assert!(selector.weight(&gym, &any, &tracker) > 1.0);

        let only_road = any.copy_with(ShuffleOverrides {
            consistent_playlists: Some(vec!["road-trip".into()]),
            ..Default::default()
        });
        assert!(selector.weight(&road, &only_road, &tracker) > 1.0);
        assert_eq!(selector.weight(&gym, &only_road, &tracker), 1.0);
    }

    #[test]
    fn anti_repeat_penalty_decays_with_rank() {
        let songs = vec![
            create_test_song("a", "A", 0),
            create_test_song("b", "B", 0),
            create_test_song("c", "C", 0),
        ];
        let selector = WeightedSelector::new(&songs);
        let mut tracker = AntiRepeatTracker::new(4);
        tracker.record_play(&songs[0]);
        tracker.record_play(&songs[1]);

        let config = neutral_config().copy_with(ShuffleOverrides {
            anti_repeat_enabled: Some(true),
            ..Default::default()
        });

        let newest = selector.weight(&songs[1], &config, &tracker);
        let older = selector.weight(&songs[0], &config, &tracker);
        let fresh = selector.weight(&songs[2], &config, &tracker);
        assert!(newest < older);
        assert!(older < fresh);
        assert_eq!(fresh, 1.0);
    }

    #[test]
    fn streak_breaker_penalizes_same_artist() {
        let first = create_test_song("a", "Band", 0);
        let same = create_test_song("b", "Band", 0);
        let other = create_test_song("c", "Solo", 0);
        let selector = WeightedSelector::new(&[]);
        let mut tracker = AntiRepeatTracker::new(3);
        tracker.record_play(&first);

        let config = neutral_config().copy_with(ShuffleOverrides {
            streak_breaker_enabled: Some(true),
            ..Default::default()
        });

        let same_weight = selector.weight(&same, &config, &tracker);
        assert!((same_weight - STREAK_ARTIST_FACTOR * STREAK_ALBUM_FACTOR).abs() < 1e-12);
        assert_eq!(selector.weight(&other, &config, &tracker), 1.0);
    }

    #[test]
    fn weight_never_below_epsilon() {
        let mut song = Song::new("a", "A", "Band", "LP");
        song.is_suggest_less = true;
        let song = Arc::new(song);

        let mut tracker = AntiRepeatTracker::new(2);
        tracker.record_play(&song);

        let config = ShuffleConfig::default().copy_with(ShuffleOverrides {
            avoid_repeating_artists: Some(true),
            avoid_repeating_albums: Some(true),
            suggest_less_weight: Some(-99),
            suggest_less_multiplier: Some(0.01),
            ..Default::default()
        });

        let weight = WeightedSelector::new(&[]).weight(&song, &config, &tracker);
        assert!(weight >= EPSILON);
    }

    #[test]
    fn prepared_pool_matches_single_song_weight() {
        let mut songs = vec![
            create_test_song("a", "The Band", 3),
            create_test_song("b", "the band ", 9),
            create_test_song("c", "Solo", 0),
            create_test_song("d", "Unknown", 40),
            create_test_song("e", "Other", 12),
        ];
        let duplicate = Arc::clone(&songs[4]);
        songs.push(duplicate);

        let mut tracker = AntiRepeatTracker::new(4);
        tracker.record_play(&create_test_song("e", "OTHER", 0));
        tracker.record_play(&create_test_song("x", "THE BAND", 0));

        let config = ShuffleConfig::default().copy_with(ShuffleOverrides {
            avoid_repeating_artists: Some(true),
            least_played_weight: Some(70),
            ..Default::default()
        });
        let selector = WeightedSelector::new(&songs);
        let pool = CandidatePool::new(&selector, songs.clone(), &config);
        let recency = pool.recency(&tracker);

        for (entry, song) in pool.entries.iter().zip(&songs) {
            let prepared = floor_weight(entry.base * recency.factor(entry, &config));
            let direct = selector.weight(song, &config, &tracker);
            assert!((prepared - direct).abs() < 1e-12, "{}", song.id);
        }
        assert_eq!(pool.entries[4].song, pool.entries[5].song);
        assert_eq!(pool.eligible(&recency, &config), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_candidates_fail() {
        let selector = WeightedSelector::new(&[]);
        let mut rng = StdRng::seed_from_u64(1);
        let result = selector.select(
            &[],
            &ShuffleConfig::default(),
            &AntiRepeatTracker::new(3),
            &mut rng,
        );
        assert!(matches!(result, Err(PlaybackError::EmptyCandidateSet)));
    }

    #[test]
    fn single_candidate_always_selected() {
        let songs = vec![create_test_song("only", "A", 0)];
        let mut tracker = AntiRepeatTracker::new(3);
        tracker.record_play(&songs[0]);

        let mut rng = StdRng::seed_from_u64(9);
        let selector = WeightedSelector::new(&songs);
        let index = selector
            .select(&songs, &ShuffleConfig::default(), &tracker, &mut rng)
            .unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn never_repeats_last_song() {
        let songs = vec![create_test_song("a", "A", 0), create_test_song("b", "B", 0)];
        let mut tracker = AntiRepeatTracker::new(1);
        tracker.record_play(&songs[0]);

        let selector = WeightedSelector::new(&songs);
        let config = neutral_config();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let index = selector.select(&songs, &config, &tracker, &mut rng).unwrap();
            assert_eq!(index, 1);
        }
    }

    #[test]
    fn avoid_repeating_songs_falls_back_when_all_recent() {
        let songs = vec![create_test_song("a", "A", 0), create_test_song("b", "B", 0)];
        let mut tracker = AntiRepeatTracker::new(5);
        tracker.record_play(&songs[0]);
        tracker.record_play(&songs[1]);

        let selector = WeightedSelector::new(&songs);
        let mut rng = StdRng::seed_from_u64(5);
        let index = selector
            .select(&songs, &ShuffleConfig::default(), &tracker, &mut rng)
            .unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn draw_sequence_without_replacement() {
        let songs: Vec<Arc<Song>> = (0..6)
            .map(|i| create_test_song(&format!("s{i}"), &format!("Artist {i}"), i))
            .collect();
        let selector = WeightedSelector::new(&songs);
        let mut tracker = AntiRepeatTracker::new(3);
        let mut rng = StdRng::seed_from_u64(21);

        let drawn = selector
            .draw_sequence(songs.clone(), 10, &ShuffleConfig::default(), &mut tracker, &mut rng)
            .unwrap();

        let ids: std::collections::HashSet<&str> = drawn.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(drawn.len(), 6);
        assert_eq!(ids.len(), 6);
        assert_eq!(tracker.last_song(), Some(&drawn[5].id));
    }

    #[test]
    fn draw_index_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let index = draw_index(&[EPSILON, EPSILON, EPSILON], &mut rng);
            assert!(index < 3);
        }
        assert_eq!(draw_index(&[0.0, 5.0], &mut rng), 1);
    }
}
