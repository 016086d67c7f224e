use crate::errors::SheetsError;
use google_cloud_auth::credentials::service_account::{AccessSpecifier, Builder};
use google_cloud_auth::credentials::{CacheableResource, Credentials};
use http::{Extensions, HeaderMap};
use serde_json::Value;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Service-account credentials scoped to the spreadsheets API.
pub struct ServiceAccount {
    credentials: Credentials,
    client_email: Option<String>,
}

impl ServiceAccount {
    /// Parses a JSON service-account key.
    ///
    /// Fails with `CredentialParse` when the key is not JSON at all, and with
    /// `Auth` when it is JSON but not a usable service-account key.
    pub fn from_json(service_key_json: &str) -> Result<Self, SheetsError> {
        let key: Value = serde_json::from_str(service_key_json)?;
        let client_email = key
            .get("client_email")
            .and_then(Value::as_str)
            .map(str::to_string);

        let credentials = Builder::new(key)
            .with_access_specifier(AccessSpecifier::from_scopes([SPREADSHEETS_SCOPE]))
            .build()
            .map_err(|e| SheetsError::Auth(e.to_string()))?;

        Ok(ServiceAccount {
            credentials,
            client_email,
        })
    }

    pub fn client_email(&self) -> Option<&str> {
        self.client_email.as_deref()
    }

    /// Returns the `Authorization` headers for the next request.
    ///
    /// Tokens are minted and cached by the underlying credentials.
    pub async fn auth_headers(&self) -> Result<HeaderMap, SheetsError> {
        let headers = self
            .credentials
            .headers(Extensions::new())
            .await
            .map_err(|e| SheetsError::Auth(e.to_string()))?;

        match headers {
            CacheableResource::New { data, .. } => Ok(data),
            CacheableResource::NotModified => Err(SheetsError::Auth(
                "credentials did not return any headers".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_json_key() {
        let result = ServiceAccount::from_json("invalid-json");
        assert!(matches!(result, Err(SheetsError::CredentialParse(_))));
    }

    #[test]
    fn test_rejects_truncated_key() {
        let result = ServiceAccount::from_json(r#"{"type": "service_account","#);
        assert!(matches!(result, Err(SheetsError::CredentialParse(_))));
    }

    #[test]
    fn test_rejects_incomplete_service_account_key() {
        let result =
            ServiceAccount::from_json(r#"{"type": "service_account", "client_email": "a@b"}"#);
        match result {
            Err(err @ SheetsError::Auth(_)) => assert_eq!(err.status(), None),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("incomplete key was accepted"),
        }
    }
}
