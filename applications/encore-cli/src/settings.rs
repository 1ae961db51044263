/// CLI settings
use anyhow::Context;
use encore_playback::{EngineConfig, Personality};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "encore.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliSettings {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Library JSON file (tracks plus user data)
    #[serde(default = "default_library_path")]
    pub library_path: PathBuf,

    /// Personality used when the saved config has none and none is given
    #[serde(default)]
    pub personality: Personality,

    /// Where shuffle config and queue state are kept between runs
    #[serde(default)]
    pub state_path: Option<PathBuf>,

    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl CliSettings {
    /// Load settings from a file and `ENCORE_*` environment variables
    ///
    /// An explicit `path` must exist; otherwise `encore.toml` is read if
    /// present. Environment variables win over the file, with `__` between
    /// nested keys (`ENCORE_ENGINE__HISTORY_LIMIT=20`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with(path, environment())
    }

    /// Same as [`load`](Self::load) with a caller-supplied environment source
    pub fn load_with(path: Option<&Path>, env: config::Environment) -> anyhow::Result<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => settings.add_source(config::File::from(path).required(true)),
            None => settings
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false)),
        };
        settings = settings.add_source(env);

        let loaded = settings
            .build()
            .context("Failed to read settings")?
            .try_deserialize::<Self>()
            .context("Invalid settings")?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.history_limit == 0 {
            anyhow::bail!("engine.history_limit must be at least 1");
        }
        if self.engine.max_generated_queue == 0 {
            anyhow::bail!("engine.max_generated_queue must be at least 1");
        }
        Ok(())
    }
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            library_path: default_library_path(),
            personality: Personality::default(),
            state_path: None,
            log_filter: default_log_filter(),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("ENCORE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn default_library_path() -> PathBuf {
    PathBuf::from("library.json")
}

fn default_log_filter() -> String {
    "encore=info".to_string()
}
