use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use observability::ObservabilityError;
use signup_api::credentials::Secrets;
use signup_api::errors::SignupApiError;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod observability;

#[derive(Parser)]
#[command(name = "signup", about = "Beta signup form endpoint")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the signup endpoint
    Run(ConfigArgs),
    /// Load and validate the configuration, then exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// YAML config file; built-in defaults are used when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Observability(#[from] ObservabilityError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    SignupApi(#[from] SignupApiError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::CheckConfig(args) => check_config(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("signup: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: ConfigArgs) -> Result<(), CliError> {
    let config = Config::load(args.config.as_deref())?;

    let _sentry_guard = observability::init_logging(&config.common.logging)?;
    if let Some(metrics) = &config.common.metrics {
        observability::init_metrics(metrics)?;
    }

    let secrets = Secrets::from_env(&config.signup_api.secrets);

    tracing::info!(
        host = %config.signup_api.listener.host,
        port = config.signup_api.listener.port,
        path = %config.signup_api.signup_path,
        "Starting signup API"
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(signup_api::run(config.signup_api, secrets))?;

    Ok(())
}

fn check_config(args: ConfigArgs) -> Result<(), CliError> {
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::from_env(&config.signup_api.secrets);

    println!("config ok");
    for name in secrets.missing() {
        println!("warning: environment variable {name} is not set");
    }

    Ok(())
}
