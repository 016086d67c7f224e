pub mod config;
pub mod credentials;
pub mod errors;
pub mod handler;
pub mod metrics_defs;
pub mod retry;
pub mod service;
pub mod validation;

#[cfg(test)]
mod testutils;

use config::Config;
use credentials::Secrets;
use errors::SignupApiError;
use handler::SignupHandler;
use service::SignupService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use sheets::client::SheetsClient;
use sheets::{GoogleSheetsConnector, SheetsConnector};
use std::sync::Arc;

/// Runs the signup and admin listeners against the Google Sheets API until
/// either listener fails or the process receives Ctrl-C.
pub async fn run(config: Config, secrets: Secrets) -> Result<(), SignupApiError> {
    config.validate()?;

    let client = SheetsClient::new(config.sheets.base_url()?, config.sheets.http_timeout())?;

    run_with_connector(config, secrets, Arc::new(GoogleSheetsConnector::new(client))).await
}

pub async fn run_with_connector(
    config: Config,
    secrets: Secrets,
    connector: Arc<dyn SheetsConnector>,
) -> Result<(), SignupApiError> {
    if !secrets.is_complete() {
        tracing::warn!(
            missing = %secrets.missing().join(", "),
            "Secrets are missing, signups will fail with a configuration error"
        );
    }

    let handler = Arc::new(SignupHandler::new(&config, secrets, connector));

    let ready_handler = handler.clone();
    let admin_service = AdminService::<_, SignupApiError>::new(move || ready_handler.is_ready());
    let signup_service = SignupService::new(handler, &config);

    let signup_task = run_http_service(&config.listener.host, config.listener.port, signup_service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::select! {
        result = signup_task => result?,
        result = admin_task => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl-C, shutting down"),
    }

    Ok(())
}
