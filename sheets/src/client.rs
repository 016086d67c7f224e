use crate::errors::SheetsError;
use crate::service_account::ServiceAccount;
use async_trait::async_trait;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com";

/// Where an appended row lands.
#[derive(Clone, Debug, PartialEq)]
pub struct AppendTarget {
    pub spreadsheet_id: String,
    /// A1 notation, e.g. `Beta Signups!A:B`
    pub range: String,
    /// `USER_ENTERED` or `RAW`
    pub value_input_option: String,
}

/// What the API reports back about a successful append.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppendSummary {
    pub updated_range: Option<String>,
    pub updated_rows: Option<u32>,
}

/// Appends a single row to a spreadsheet.
#[async_trait]
pub trait RowAppender: Send + Sync {
    async fn append_row(
        &self,
        target: &AppendTarget,
        row: &[Value],
    ) -> Result<AppendSummary, SheetsError>;
}

/// Builds an authorized [`RowAppender`] from a JSON service-account key.
///
/// Construction is synchronous and does not touch the network. A key that
/// cannot be parsed fails here, before any request is made.
pub trait SheetsConnector: Send + Sync {
    fn connect(&self, service_key_json: &str) -> Result<Box<dyn RowAppender>, SheetsError>;
}

#[derive(Serialize)]
struct ValueRange<'a> {
    values: [&'a [Value]; 1],
}

#[derive(Deserialize)]
struct AppendValuesResponse {
    updates: Option<AppendSummary>,
}

/// Thin wrapper over the `spreadsheets.values.append` REST call.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SheetsClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(SheetsClient { http, base_url })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}:append?valueInputOption=...`
    pub fn append_url(&self, target: &AppendTarget) -> Result<Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                target.spreadsheet_id.as_str(),
                "values",
                &format!("{}:append", target.range),
            ]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", &target.value_input_option);

        Ok(url)
    }

    pub async fn append_values(
        &self,
        auth_headers: HeaderMap,
        target: &AppendTarget,
        row: &[Value],
    ) -> Result<AppendSummary, SheetsError> {
        let url = self.append_url(target)?;

        let response = self
            .http
            .post(url)
            .headers(auth_headers)
            .json(&ValueRange { values: [row] })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(SheetsError::from_response(status.as_u16(), &body));
        }

        // The append already happened; an unreadable summary is not a failure.
        let summary = match serde_json::from_slice::<AppendValuesResponse>(&body) {
            Ok(parsed) => parsed.updates.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse append response");
                AppendSummary::default()
            }
        };

        Ok(summary)
    }
}

fn map_transport_error(e: reqwest::Error) -> SheetsError {
    if e.is_timeout() {
        SheetsError::Timeout
    } else {
        SheetsError::Transport(e)
    }
}

/// Connector backed by the real Google Sheets API.
#[derive(Clone)]
pub struct GoogleSheetsConnector {
    client: SheetsClient,
}

impl GoogleSheetsConnector {
    pub fn new(client: SheetsClient) -> Self {
        GoogleSheetsConnector { client }
    }
}

impl SheetsConnector for GoogleSheetsConnector {
    fn connect(&self, service_key_json: &str) -> Result<Box<dyn RowAppender>, SheetsError> {
        let account = ServiceAccount::from_json(service_key_json)?;
        tracing::debug!(
            client_email = account.client_email().unwrap_or("unknown"),
            "Built service account credentials"
        );

        Ok(Box::new(AuthorizedSheets {
            client: self.client.clone(),
            account,
        }))
    }
}

struct AuthorizedSheets {
    client: SheetsClient,
    account: ServiceAccount,
}

#[async_trait]
impl RowAppender for AuthorizedSheets {
    async fn append_row(
        &self,
        target: &AppendTarget,
        row: &[Value],
    ) -> Result<AppendSummary, SheetsError> {
        let headers = self.account.auth_headers().await?;
        self.client.append_values(headers, target, row).await
    }
}
