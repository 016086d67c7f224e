use crate::retry::RetryPolicy;
use serde::Deserialize;
use sheets::SheetsError;
use sheets::client::DEFAULT_API_BASE_URL;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener both bind {0}")]
    ListenerConflict(String),

    #[error("Signup path must start with '/': {0}")]
    InvalidPath(String),

    #[error("{0} must be greater than 0")]
    ZeroValue(&'static str),

    #[error("Empty sheet range")]
    EmptyRange,

    #[error("Empty environment variable name for {0}")]
    EmptyEnvName(&'static str),
}

/// Signup API configuration
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Listener for signup submissions
    pub listener: Listener,
    /// Listener for `/health` and `/ready`
    pub admin_listener: Listener,
    /// Path the signup form posts to
    pub signup_path: String,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Upper bound on building the client plus the whole retry sequence
    pub request_deadline_secs: u64,
    pub retry: RetryConfig,
    pub sheets: SheetsConfig,
    pub secrets: SecretsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default(),
            admin_listener: Listener {
                host: "127.0.0.1".into(),
                port: 3001,
            },
            signup_path: "/api/beta-signup".into(),
            max_body_bytes: 16 * 1024,
            request_deadline_secs: 60,
            retry: RetryConfig::default(),
            sheets: SheetsConfig::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.listener == self.admin_listener {
            return Err(ValidationError::ListenerConflict(format!(
                "{}:{}",
                self.listener.host, self.listener.port
            )));
        }

        if !self.signup_path.starts_with('/') {
            return Err(ValidationError::InvalidPath(self.signup_path.clone()));
        }

        if self.max_body_bytes == 0 {
            return Err(ValidationError::ZeroValue("max_body_bytes"));
        }

        if self.request_deadline_secs == 0 {
            return Err(ValidationError::ZeroValue("request_deadline_secs"));
        }

        self.sheets.validate()?;
        self.secrets.validate()
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Backoff settings for rate-limited appends.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every further retry
    pub base_delay_ms: u64,
    /// Upper bound (exclusive) of the random delay added to each wait
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 4,
            base_delay_ms: 1000,
            max_jitter_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    /// Values are parsed as if typed into the sheet UI
    UserEntered,
    /// Values are stored as-is
    Raw,
}

impl ValueInputOption {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::UserEntered => "USER_ENTERED",
            ValueInputOption::Raw => "RAW",
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SheetsConfig {
    /// Defaults to the public Google endpoint when unset
    pub api_base_url: Option<Url>,
    /// A1 range the row is appended after
    pub range: String,
    pub value_input_option: ValueInputOption,
    /// Timeout of a single append call
    pub http_timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        SheetsConfig {
            api_base_url: None,
            range: "Beta Signups!A:B".into(),
            value_input_option: ValueInputOption::UserEntered,
            http_timeout_secs: 10,
        }
    }
}

impl SheetsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.range.trim().is_empty() {
            return Err(ValidationError::EmptyRange);
        }
        if self.http_timeout_secs == 0 {
            return Err(ValidationError::ZeroValue("http_timeout_secs"));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn base_url(&self) -> Result<Url, SheetsError> {
        match &self.api_base_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(DEFAULT_API_BASE_URL)
                .map_err(|_| SheetsError::InvalidUrl(DEFAULT_API_BASE_URL.to_string())),
        }
    }
}

/// Names of the environment variables holding the deployment secrets.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecretsConfig {
    /// JSON service-account key
    pub service_key_env: String,
    /// Target spreadsheet id
    pub sheet_id_env: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        SecretsConfig {
            service_key_env: "GOOGLE_SERVICE_KEY".into(),
            sheet_id_env: "SHEET_ID".into(),
        }
    }
}

impl SecretsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_key_env.is_empty() {
            return Err(ValidationError::EmptyEnvName("service_key_env"));
        }
        if self.sheet_id_env.is_empty() {
            return Err(ValidationError::EmptyEnvName("sheet_id_env"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.signup_path, "/api/beta-signup");
        assert_eq!(config.retry.max_retries, 4);
        assert_eq!(config.sheets.range, "Beta Signups!A:B");
        assert_eq!(config.secrets.service_key_env, "GOOGLE_SERVICE_KEY");
        assert_eq!(config.secrets.sheet_id_env, "SHEET_ID");
    }

    #[test]
    fn test_default_base_url() {
        let sheets = SheetsConfig::default();

        assert_eq!(sheets.api_base_url, None);
        assert_eq!(
            sheets.base_url().unwrap().as_str(),
            "https://sheets.googleapis.com/"
        );
    }

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 8080
admin_listener:
    host: "0.0.0.0"
    port: 8081
signup_path: /signup
request_deadline_secs: 20
retry:
    max_retries: 2
    base_delay_ms: 250
sheets:
    api_base_url: "http://127.0.0.1:9000"
    range: "Signups!A:B"
    value_input_option: RAW
secrets:
    service_key_env: SIGNUP_SERVICE_KEY
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.signup_path, "/signup");
        assert_eq!(config.request_deadline(), Duration::from_secs(20));
        assert_eq!(config.sheets.value_input_option, ValueInputOption::Raw);
        assert_eq!(
            config.sheets.base_url().unwrap().as_str(),
            "http://127.0.0.1:9000/"
        );
        assert_eq!(config.secrets.service_key_env, "SIGNUP_SERVICE_KEY");
        // Unset fields inside a section keep their defaults
        assert_eq!(config.secrets.sheet_id_env, "SHEET_ID");
        assert_eq!(config.sheets.http_timeout_secs, 10);

        let policy = config.retry.policy();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_jitter, Duration::from_millis(1000));
    }

    #[test]
    fn test_validation_errors() {
        let base_config = Config::default();

        let mut config = base_config.clone();
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = base_config.clone();
        config.admin_listener = config.listener.clone();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::ListenerConflict(_)
        ));

        let mut config = base_config.clone();
        config.signup_path = "api/beta-signup".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPath(_)
        ));

        let mut config = base_config.clone();
        config.request_deadline_secs = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::ZeroValue("request_deadline_secs")
        ));

        let mut config = base_config.clone();
        config.sheets.range = "  ".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyRange
        ));

        let mut config = base_config;
        config.secrets.sheet_id_env = String::new();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyEnvName("sheet_id_env")
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid URL
        assert!(serde_yaml::from_str::<Config>("sheets: {api_base_url: not-a-url}").is_err());

        // Invalid port type
        assert!(
            serde_yaml::from_str::<Config>(r#"listener: {host: "0.0.0.0", port: "http"}"#)
                .is_err()
        );

        // Listener needs both fields
        assert!(serde_yaml::from_str::<Config>(r#"listener: {host: "0.0.0.0"}"#).is_err());

        // Unknown value input option
        assert!(serde_yaml::from_str::<ValueInputOption>("FORMULA").is_err());
    }
}
