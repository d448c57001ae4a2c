//! Application configuration
//!
//! Read from `config.toml` in the platform config directory
//! (e.g., ~/.config/flashdeck/config.toml). Every field is optional:
//!
//! ```toml
//! data_dir = "/home/me/flashcards"
//!
//! [scheduler]
//! interval_growth = 2.5
//!
//! [heatmap]
//! columns = 26
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::SchedulerParams;
use crate::study_events::MAX_HEATMAP_COLUMNS;

const APP_DIR: &str = "flashdeck";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid scheduler settings: {0}")]
    Scheduler(String),

    #[error("Heatmap must be between 1 and {max} columns wide", max = MAX_HEATMAP_COLUMNS)]
    HeatmapColumns,

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct HeatmapConfig {
    /// Number of week columns
    pub columns: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self { columns: 53 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct AppConfig {
    /// Where sets, cards and study events are stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub scheduler: SchedulerParams,
    pub heatmap: HeatmapConfig,
}

impl AppConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location, or defaults if there is none
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(CONFIG_FILE),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate().map_err(ConfigError::Scheduler)?;
        if !(1..=MAX_HEATMAP_COLUMNS).contains(&self.heatmap.columns) {
            return Err(ConfigError::HeatmapColumns);
        }
        Ok(())
    }

    /// Configured data directory, falling back to the platform data directory
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        default_data_dir()
    }
}

/// Platform data directory (e.g., ~/.local/share/flashdeck)
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or(ConfigError::DataDirNotFound)
}
