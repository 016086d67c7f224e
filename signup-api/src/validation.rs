use crate::errors::SignupError;
use serde::Deserialize;
use serde_json::Value;

/// Body of a signup submission as it arrives on the wire.
///
/// Both fields are kept as raw JSON; absent fields decode to `null`.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct SignupPayload {
    #[serde(default)]
    pub email: Value,
    /// Caller-supplied, not interpreted
    #[serde(default)]
    pub timestamp: Value,
}

impl SignupPayload {
    /// Decodes a request body. Only bodies that are not JSON fail; a JSON
    /// value that is not an object carries no email.
    pub fn from_slice(body: &[u8]) -> Result<Self, SignupError> {
        match serde_json::from_slice::<Value>(body)? {
            value @ Value::Object(_) => Ok(serde_json::from_value(value)?),
            _ => Ok(SignupPayload::default()),
        }
    }
}

/// A submission that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct SignupRequest {
    pub email: String,
    pub timestamp: Value,
}

impl SignupRequest {
    /// The `[email, timestamp]` row written to the sheet.
    pub fn to_row(&self) -> Vec<Value> {
        vec![Value::String(self.email.clone()), self.timestamp.clone()]
    }
}

/// Only the presence of an `@` is checked; `a@` and `@@` are accepted.
pub fn is_valid_email(email: &str) -> bool {
    email.contains('@')
}

/// Anything but a string containing `@` is an invalid email.
pub fn validate(payload: SignupPayload) -> Result<SignupRequest, SignupError> {
    match payload.email {
        Value::String(email) if is_valid_email(&email) => Ok(SignupRequest {
            email,
            timestamp: payload.timestamp,
        }),
        _ => Err(SignupError::InvalidEmail),
    }
}
