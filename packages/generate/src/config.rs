//! TOML analysis configuration.
//!
//! ```toml
//! [data]
//! incidents_path = "data/campus_incidents.csv"
//! generated_dir = "data/generated"
//!
//! [vocabulary]
//! policy = "closed"
//! locations = ["Library", "Cafeteria"]
//! incident_types = ["theft", "vandalism"]
//!
//! [predictor]
//! treeCount = 100
//! seed = 42
//!
//! [map]
//! zoom = 14
//! ```

use std::path::{Path, PathBuf};

use campus_safety_datastore::{VocabularyPolicy, paths};
use campus_safety_predictor::PredictorConfig;
use campus_safety_render::MapStyle;
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CAMPUS_SAFETY_CONFIG";

/// Config file read when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "campus_safety.toml";

/// Errors that can occur while reading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`AnalysisConfig`].
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Where the incident table lives and where artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub incidents_path: PathBuf,
    pub generated_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            incidents_path: paths::default_incidents_path(),
            generated_dir: paths::generated_dir(),
        }
    }
}

/// Everything an analysis run or the API server needs to know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data: DataConfig,
    pub vocabulary: VocabularyPolicy,
    pub predictor: PredictorConfig,
    pub map: MapStyle,
}

impl AnalysisConfig {
    /// Reads the config at `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// * If the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reads the config named by `explicit`, else by [`CONFIG_ENV`], else
    /// [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// * If the chosen file exists but cannot be read or parsed
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.map_or_else(
            || {
                std::env::var_os(CONFIG_ENV)
                    .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
            },
            Path::to_path_buf,
        );
        Self::load(&path)
    }
}
