use crate::config::ValidationError;
use http::StatusCode;
use sheets::SheetsError;
use std::time::Duration;
use thiserror::Error;

pub const INVALID_EMAIL_MESSAGE: &str = "Invalid email address";
pub const CONFIGURATION_ERROR_MESSAGE: &str = "Server configuration error";
pub const HIGH_TRAFFIC_MESSAGE: &str = "High traffic right now. Please try again in a moment.";
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable. Please try again.";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save signup";

/// Errors that stop the server itself
#[derive(Error, Debug)]
pub enum SignupApiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Sheets client error: {0}")]
    Sheets(#[from] SheetsError),
}

/// Reasons a single signup submission fails.
///
/// `InvalidEmail` and `MissingConfiguration` short-circuit with their own
/// messages. Everything else is classified by [`SignupError::code`].
#[derive(Error, Debug)]
pub enum SignupError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Missing environment variables: {0}")]
    MissingConfiguration(String),

    #[error("Malformed request payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Append failed: {0}")]
    Append(#[from] SheetsError),

    #[error("Signup did not complete within {0:?}")]
    DeadlineExceeded(Duration),
}

impl SignupError {
    /// Numeric classification of the failure, defaulting to 500.
    pub fn code(&self) -> u16 {
        match self {
            SignupError::InvalidEmail => 400,
            SignupError::PayloadTooLarge(_) => 413,
            SignupError::DeadlineExceeded(_) => 503,
            SignupError::Append(e) => e.status().filter(|s| *s != 0).unwrap_or(500),
            SignupError::MissingConfiguration(_)
            | SignupError::MalformedPayload(_)
            | SignupError::BodyRead(_) => 500,
        }
    }

    /// Status sent to the client. Codes that are not error statuses become 500.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code())
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message shown to the person submitting the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            SignupError::InvalidEmail => INVALID_EMAIL_MESSAGE,
            SignupError::MissingConfiguration(_) => CONFIGURATION_ERROR_MESSAGE,
            _ => message_for_code(self.code()),
        }
    }
}

pub fn message_for_code(code: u16) -> &'static str {
    match code {
        429 => HIGH_TRAFFIC_MESSAGE,
        500 | 503 => UNAVAILABLE_MESSAGE,
        _ => SAVE_FAILED_MESSAGE,
    }
}
