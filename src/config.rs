use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub appdir: Option<String>,
    #[serde(default = "default_datadir")]
    pub datadir: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub swipe: SwipeConfig,
    #[serde(skip)]
    pub debug_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            appdir: None,
            datadir: default_datadir(),
            api: ApiConfig::default(),
            swipe: SwipeConfig::default(),
            debug_logs: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiSource {
    #[default]
    Backend,
    Omdb,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub source: ApiSource,
    #[serde(alias = "baseurl", default)]
    pub base_url: Option<String>,
    #[serde(alias = "omdbapikey", default)]
    pub omdb_api_key: Option<String>,
    #[serde(default = "default_omdb_url")]
    pub omdb_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            source: ApiSource::default(),
            base_url: None,
            omdb_api_key: None,
            omdb_url: default_omdb_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// How fetched batches are merged into the queue. Movies already queued or
/// already decided on in this session are always dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupePolicy {
    /// Movies liked in earlier sessions may be offered again.
    None,
    /// Also drop anything already in the liked collection.
    #[default]
    ById,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwipeConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,
    #[serde(default)]
    pub dedupe: DedupePolicy,
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold: f64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            low_water_mark: default_low_water_mark(),
            dedupe: DedupePolicy::default(),
            velocity_threshold: default_velocity_threshold(),
            viewport_width: default_viewport_width(),
        }
    }
}

fn default_port() -> String {
    "8080".to_string()
}

fn default_datadir() -> String {
    "./data".to_string()
}

fn default_omdb_url() -> String {
    "https://www.omdbapi.com/".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_batch_size() -> usize {
    10
}

fn default_low_water_mark() -> usize {
    3
}

fn default_velocity_threshold() -> f64 {
    0.2
}

fn default_viewport_width() -> f64 {
    1280.0
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        Self::from_yaml(path, &content)
    }

    pub fn from_yaml(path: &str, content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        config.apply_env();
        config.validate()?;

        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("MOVIESWIPE_API_BASE_URL") {
            if !url.is_empty() {
                self.api.base_url = Some(url);
            }
        }
        if let Ok(key) = std::env::var("OMDB_API_KEY") {
            if !key.is_empty() {
                self.api.omdb_api_key = Some(key);
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.api.source {
            ApiSource::Backend if self.api.base_url.is_none() => {
                return Err(ConfigError::Invalid("api.base_url is required for the backend source".to_string()));
            }
            ApiSource::Omdb if self.api.omdb_api_key.is_none() => {
                return Err(ConfigError::Invalid("api.omdb_api_key is required for the omdb source".to_string()));
            }
            _ => {}
        }
        if self.swipe.batch_size == 0 {
            return Err(ConfigError::Invalid("swipe.batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn get_data_path(&self) -> PathBuf {
        PathBuf::from(&self.datadir)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let yaml = r#"
            api:
              base_url: http://localhost:5000/api/movies
        "#;
        let config = Config::from_yaml("test.yaml", yaml).unwrap();
        assert_eq!(config.listen.port, "8080");
        assert_eq!(config.datadir, "./data");
        assert_eq!(config.api.source, ApiSource::Backend);
        assert_eq!(config.swipe.batch_size, 10);
        assert_eq!(config.swipe.low_water_mark, 3);
        assert_eq!(config.swipe.dedupe, DedupePolicy::ById);
        assert_eq!(config.swipe.velocity_threshold, 0.2);
    }

    #[test]
    fn test_omdb_source() {
        let yaml = r#"
            listen:
              port: "9000"
            api:
              source: omdb
              omdbapikey: abc123
            swipe:
              dedupe: none
              low_water_mark: 5
        "#;
        let config = Config::from_yaml("test.yaml", yaml).unwrap();
        assert_eq!(config.listen.port, "9000");
        assert_eq!(config.api.source, ApiSource::Omdb);
        assert_eq!(config.api.omdb_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.swipe.dedupe, DedupePolicy::None);
        assert_eq!(config.swipe.low_water_mark, 5);
    }

    #[test]
    fn test_missing_key_rejected() {
        let yaml = "api:\n  source: omdb\n";
        if std::env::var("OMDB_API_KEY").is_ok() {
            return;
        }
        assert!(matches!(
            Config::from_yaml("test.yaml", yaml),
            Err(ConfigError::Invalid(_))
        ));
    }
}
