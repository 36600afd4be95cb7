//! Configuration file support for SaunaFlow.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/saunaflow/config.toml`.
//! Every section is optional; missing keys fall back to defaults.

use crate::adjust::{BASE_COLD_TEMP, BASE_HEAT_TEMP, COLD_TEMP_RANGE, HEAT_TEMP_RANGE};
use crate::{Error, Goal, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub suggestions: SuggestionConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Defaults applied when starting a ritual
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Usual sauna temperature (°C), used when none is given
    #[serde(default = "default_heat_temp")]
    pub heat_temp: i32,

    /// Usual plunge temperature (°C), used when none is given
    #[serde(default = "default_cold_temp")]
    pub cold_temp: i32,

    /// Goal for custom rituals when the profile has none
    #[serde(default = "default_goal")]
    pub default_goal: Goal,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heat_temp: default_heat_temp(),
            cold_temp: default_cold_temp(),
            default_goal: default_goal(),
        }
    }
}

/// Suggestion provider configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SuggestionConfig {
    /// JSON file written by an external advisor; presets are used when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(std::env::temp_dir);
    base.join("saunaflow")
}

fn default_heat_temp() -> i32 {
    BASE_HEAT_TEMP
}

fn default_cold_temp() -> i32 {
    BASE_COLD_TEMP
}

fn default_goal() -> Goal {
    Goal::Relax
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(std::env::temp_dir);
        base.join("saunaflow").join("config.toml")
    }

    /// Check values a user may have typed by hand
    pub fn validate(&self) -> Result<()> {
        if !HEAT_TEMP_RANGE.contains(&self.session.heat_temp) {
            return Err(Error::Config(format!(
                "session.heat_temp {} outside {}..={}",
                self.session.heat_temp,
                HEAT_TEMP_RANGE.start(),
                HEAT_TEMP_RANGE.end()
            )));
        }
        if !COLD_TEMP_RANGE.contains(&self.session.cold_temp) {
            return Err(Error::Config(format!(
                "session.cold_temp {} outside {}..={}",
                self.session.cold_temp,
                COLD_TEMP_RANGE.start(),
                COLD_TEMP_RANGE.end()
            )));
        }
        Ok(())
    }
}
