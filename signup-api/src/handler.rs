use crate::config::Config;
use crate::credentials::Secrets;
use crate::errors::SignupError;
use crate::metrics_defs::{SIGNUP_DURATION, SIGNUP_REQUESTS};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::validation::{SignupPayload, SignupRequest, validate};
use http::StatusCode;
use serde::Serialize;
use sheets::client::AppendSummary;
use sheets::{AppendTarget, SheetsConnector};
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// JSON body of every signup response.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SignupReply {
    Success { success: bool },
    Failure { error: &'static str },
}

#[derive(Debug, PartialEq)]
pub struct SignupResponse {
    pub status: StatusCode,
    pub body: SignupReply,
}

impl SignupResponse {
    fn saved() -> Self {
        SignupResponse {
            status: StatusCode::OK,
            body: SignupReply::Success { success: true },
        }
    }

    fn failed(error: &SignupError) -> Self {
        SignupResponse {
            status: error.status_code(),
            body: SignupReply::Failure {
                error: error.user_message(),
            },
        }
    }
}

/// Turns one submission into one appended row.
///
/// Validation and configuration problems are answered before anything is
/// sent to the spreadsheet. Building the client and the retried append run
/// under a single deadline.
pub struct SignupHandler {
    secrets: Secrets,
    connector: Arc<dyn SheetsConnector>,
    retry: RetryPolicy,
    range: String,
    value_input_option: &'static str,
    deadline: Duration,
}

impl SignupHandler {
    pub fn new(config: &Config, secrets: Secrets, connector: Arc<dyn SheetsConnector>) -> Self {
        SignupHandler {
            secrets,
            connector,
            retry: config.retry.policy(),
            range: config.sheets.range.clone(),
            value_input_option: config.sheets.value_input_option.as_str(),
            deadline: config.request_deadline(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.secrets.is_complete()
    }

    pub async fn handle(&self, body: &[u8]) -> SignupResponse {
        let started = Instant::now();
        let result = self.process(body).await;
        self.finish(started, result)
    }

    /// Answers a submission whose body could not even be read.
    pub fn reject(&self, error: SignupError) -> SignupResponse {
        self.finish(Instant::now(), Err(error))
    }

    fn finish(
        &self,
        started: Instant,
        result: Result<AppendSummary, SignupError>,
    ) -> SignupResponse {
        let response = match result {
            Ok(summary) => {
                tracing::info!(
                    updated_range = summary.updated_range.as_deref().unwrap_or("unknown"),
                    "Signup saved"
                );
                SignupResponse::saved()
            }
            Err(e) => {
                log_failure(&e);
                SignupResponse::failed(&e)
            }
        };

        counter!(SIGNUP_REQUESTS, "status" => response.status.as_u16().to_string()).increment(1);
        histogram!(SIGNUP_DURATION).record(started.elapsed().as_secs_f64());

        response
    }

    async fn process(&self, body: &[u8]) -> Result<AppendSummary, SignupError> {
        let payload = SignupPayload::from_slice(body)?;
        let request = validate(payload)?;
        let credentials = self.secrets.resolve()?;

        let target = AppendTarget {
            spreadsheet_id: credentials.sheet_id,
            range: self.range.clone(),
            value_input_option: self.value_input_option.to_string(),
        };

        tokio::time::timeout(
            self.deadline,
            self.append(&credentials.service_key_json, &target, &request),
        )
        .await
        .map_err(|_| SignupError::DeadlineExceeded(self.deadline))?
    }

    async fn append(
        &self,
        service_key_json: &str,
        target: &AppendTarget,
        request: &SignupRequest,
    ) -> Result<AppendSummary, SignupError> {
        let appender = self.connector.connect(service_key_json)?;
        let row = request.to_row();

        let summary = retry_with_backoff(&self.retry, || appender.append_row(target, &row)).await?;
        Ok(summary)
    }
}

fn log_failure(error: &SignupError) {
    match error {
        SignupError::InvalidEmail => tracing::debug!("Rejected signup with invalid email"),
        SignupError::MissingConfiguration(names) => {
            tracing::error!(missing = %names, "Missing environment variables")
        }
        _ => tracing::error!(error = %error, code = error.code(), "Beta signup error"),
    }
}
