use serde::Deserialize;

/// Errors returned by the spreadsheet collaborator.
///
/// Every variant maps to an optional numeric status, which callers use to
/// decide whether to retry and how to answer their own clients.
#[derive(thiserror::Error, Debug)]
pub enum SheetsError {
    #[error("sheets API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("sheets request timed out")]
    Timeout,
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service key is not valid JSON: {0}")]
    CredentialParse(#[from] serde_json::Error),
    #[error("could not authenticate service account: {0}")]
    Auth(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl SheetsError {
    /// Numeric status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SheetsError::Api { status, .. } => Some(*status),
            SheetsError::Timeout => Some(503),
            SheetsError::Transport(e) if e.is_timeout() => Some(503),
            SheetsError::Transport(e) => e.status().map(|s| s.as_u16()),
            SheetsError::CredentialParse(_) | SheetsError::Auth(_) | SheetsError::InvalidUrl(_) => {
                None
            }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Builds an `Api` error from a non-success response body.
    ///
    /// Google wraps failures as `{"error": {"code": 429, "message": "..."}}`.
    /// The HTTP status wins; the envelope code is used when the status is not
    /// an error status.
    pub(crate) fn from_response(http_status: u16, body: &[u8]) -> Self {
        let envelope = serde_json::from_slice::<ErrorEnvelope>(body).ok();

        let status = match envelope.as_ref().and_then(|e| e.error.code) {
            Some(code) if http_status < 400 => code,
            _ => http_status,
        };

        let message = envelope
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

        SheetsError::Api { status, message }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
}
