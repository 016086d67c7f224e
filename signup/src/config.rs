use serde::Deserialize;
use signup_api::config::Config as SignupApiConfig;
use std::fs::File;
use std::path::Path;

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    "signup".into()
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            sentry_dsn: None,
            sentry_environment: None,
            level: "info".into(),
        }
    }
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub signup_api: SignupApiConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Reads `path` if given, otherwise falls back to the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.signup_api.validate()?;

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ValidationError(#[from] signup_api::config::ValidationError),
}
