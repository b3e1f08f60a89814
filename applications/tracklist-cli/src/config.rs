/// Harness configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracklist_playback::PlayerConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub player: PlayerConfig,

    /// Sample rate of synthetic silent assets
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl CliConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables use the `TRACKLIST_` prefix with `__` between
    /// nested keys, e.g. `TRACKLIST_PLAYER__QUEUE_CAPACITY=5`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TRACKLIST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CliError::Config(
                "sample_rate must be non-zero (set TRACKLIST_SAMPLE_RATE)".to_string(),
            ));
        }

        self.player
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}

fn default_sample_rate() -> u32 {
    1000
}
