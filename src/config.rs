use crate::crowd::EstimatorSettings;
use crate::spot::Coordinate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_CATALOG_PATH: &str = "config/spots.json";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
/// Times Square, used when a request carries no origin.
pub const DEFAULT_LOCATION: Coordinate = Coordinate::new(40.7589, -73.9851);

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub catalog: Option<CatalogSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub crowd: Option<CrowdSection>,
    #[serde(default)]
    pub location: Option<Coordinate>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CrowdSection {
    /// Seconds between periodic update rounds (default: 30)
    pub update_interval_secs: Option<u64>,
    /// Chance of the random up/down step (default: 0.3)
    pub adjustment_probability: Option<f64>,
    /// Chance of each spot being refreshed per round (default: 0.3)
    pub update_probability: Option<f64>,
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Returns the catalog path, falling back to the bundled catalog when
    /// unset or empty.
    pub fn catalog_path(&self) -> &Path {
        self.catalog
            .as_ref()
            .and_then(|c| c.path.as_deref())
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(DEFAULT_CATALOG_PATH))
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Unknown level names fall back to `INFO`.
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.logging.level.trim()).unwrap_or(tracing::Level::INFO)
    }

    pub fn default_origin(&self) -> Coordinate {
        self.location.unwrap_or(DEFAULT_LOCATION)
    }

    pub fn estimator_settings(&self) -> EstimatorSettings {
        let defaults = EstimatorSettings::default();
        let crowd = self.crowd.clone().unwrap_or_default();
        EstimatorSettings {
            adjustment_probability: crowd
                .adjustment_probability
                .unwrap_or(defaults.adjustment_probability),
            update_probability: crowd
                .update_probability
                .unwrap_or(defaults.update_probability),
            min_delay: crowd
                .min_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.min_delay),
            max_delay: crowd
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
            update_interval: crowd
                .update_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.update_interval),
        }
    }
}
