use crate::config::SecretsConfig;
use crate::errors::SignupError;
use std::fmt;

/// Deployment secrets, read from the environment once at startup.
///
/// Empty values are treated as absent.
#[derive(Clone)]
pub struct Secrets {
    names: SecretsConfig,
    service_key: Option<String>,
    sheet_id: Option<String>,
}

/// Everything needed to talk to the spreadsheet for one request.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub service_key_json: String,
    pub sheet_id: String,
}

impl Secrets {
    pub fn new(names: SecretsConfig, service_key: Option<String>, sheet_id: Option<String>) -> Self {
        Secrets {
            names,
            service_key: service_key.filter(|v| !v.is_empty()),
            sheet_id: sheet_id.filter(|v| !v.is_empty()),
        }
    }

    pub fn from_env(names: &SecretsConfig) -> Self {
        let service_key = std::env::var(&names.service_key_env).ok();
        let sheet_id = std::env::var(&names.sheet_id_env).ok();
        Secrets::new(names.clone(), service_key, sheet_id)
    }

    pub fn is_complete(&self) -> bool {
        self.service_key.is_some() && self.sheet_id.is_some()
    }

    /// Names of the variables that are not set.
    pub fn missing(&self) -> Vec<&str> {
        let mut missing = Vec::new();
        if self.service_key.is_none() {
            missing.push(self.names.service_key_env.as_str());
        }
        if self.sheet_id.is_none() {
            missing.push(self.names.sheet_id_env.as_str());
        }
        missing
    }

    pub fn resolve(&self) -> Result<Credentials, SignupError> {
        match (&self.service_key, &self.sheet_id) {
            (Some(service_key), Some(sheet_id)) => Ok(Credentials {
                service_key_json: service_key.clone(),
                sheet_id: sheet_id.clone(),
            }),
            _ => Err(SignupError::MissingConfiguration(self.missing().join(", "))),
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("sheet_id", &self.sheet_id)
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("service_key_json", &"<redacted>")
            .field("sheet_id", &self.sheet_id)
            .finish()
    }
}
