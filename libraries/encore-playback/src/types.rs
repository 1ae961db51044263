//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing playing (not started, stopped, or queue exhausted)
    Idle,

    /// Current track is playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Track finished, choosing what comes next
    Advancing,
}

/// Engine tunables
///
/// Distinct from [`ShuffleConfig`](crate::ShuffleConfig): these shape the
/// engine itself and are set once by the host, not edited by the listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for the anti-repeat window (default: 50)
    pub history_limit: usize,

    /// How long a removal can be undone (default: 4s)
    #[serde(with = "duration_secs")]
    pub undo_timeout: Duration,

    /// Most entries one shuffle may generate (default: 500)
    pub max_generated_queue: usize,

    /// Refill the queue when it runs out instead of stopping (default: true)
    pub continuous: bool,

    /// Fixed RNG seed for reproducible sessions (default: random)
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            undo_timeout: Duration::from_secs(4),
            max_generated_queue: 500,
            continuous: true,
            rng_seed: None,
        }
    }
}

/// Serde adapter storing a `Duration` as fractional seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "duration must be a non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
