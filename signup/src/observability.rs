use crate::config::{LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use sentry::ClientInitGuard;
use sentry::types::Dsn;
use shared::metrics_defs::describe_all;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("invalid sentry DSN: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not build statsd exporter: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("metrics recorder already installed")]
    RecorderInstalled,
}

/// Installs the global tracing subscriber and, if a DSN is configured, the
/// Sentry client. The returned guard flushes Sentry events when dropped.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<ClientInitGuard>, ObservabilityError> {
    let sentry_guard = match &config.sentry_dsn {
        Some(dsn) => {
            let dsn: Dsn = dsn.parse()?;
            Some(sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Into::into),
                ..Default::default()
            }))
        }
        None => None,
    };

    // RUST_LOG takes precedence over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry::integrations::tracing::layer())
        .init();

    Ok(sentry_guard)
}

/// Sends all metrics to StatsD.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), ObservabilityError> {
    let recorder =
        StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port).build(Some(config.prefix.as_str()))?;
    metrics::set_global_recorder(recorder).map_err(|_| ObservabilityError::RecorderInstalled)?;

    describe_all(signup_api::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );

    Ok(())
}
