//! Sensible daemon entry point.
//!
//! Parses the command line, installs structured logging, and runs the
//! configuration bootstrap.  Every configuration error is fatal: it is logged
//! at `error` level and the process exits with status 1.
//!
//! # Commands
//!
//! ```text
//! sensible [--root DIR] [init]   -- ensure folders + document, load, report
//! sensible [--root DIR] show     -- as init, then print the settings (secrets masked)
//! sensible [--root DIR] reset    -- back up the document and write a fresh default
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sensible_daemon::application::bootstrap;
use sensible_daemon::infrastructure::storage::{ConfigError, ConfigStore, StoreLayout};
use sensible_daemon::infrastructure::token::UuidTokenProvider;

/// Host telemetry daemon publishing sensor readings to an MQTT broker.
#[derive(Debug, Parser)]
#[command(name = "sensible", version, about)]
struct Cli {
    /// Filesystem root the compiled-in paths are resolved under.
    #[arg(long, env = "SENSIBLE_ROOT", default_value = "/")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create missing folders and the default configuration, then load it.
    Init,
    /// Load the configuration and print it with secrets masked.
    Show,
    /// Back up the configuration and replace it with a fresh default.
    Reset,
}

fn main() -> ExitCode {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = StoreLayout::rooted(&cli.root);

    match run(cli.command.unwrap_or(Command::Init), layout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, layout: StoreLayout) -> anyhow::Result<()> {
    match command {
        Command::Init => {
            let settings = bootstrap::initialize(layout)?;
            info!(
                device = %settings.discovery.device_name,
                broker = %format!("{}:{}", settings.mqtt.hostname, settings.mqtt.port),
                api_enabled = settings.api.enabled,
                plugins = settings.plugins.len(),
                "Sensible configuration ready"
            );
        }
        Command::Show => {
            let settings = bootstrap::initialize(layout)?;
            print!("{}", sensible_core::encode(&settings.redacted())?);
        }
        Command::Reset => {
            let mut store = ConfigStore::new(layout, Box::new(UuidTokenProvider));
            let settings = bootstrap::regenerate(&mut store)?;
            info!(
                path = %store.layout().settings_file.display(),
                plugins = settings.plugins.len(),
                "configuration reset to defaults"
            );
        }
    }
    Ok(())
}

/// Logs a fatal startup error, naming the offending field when there is one.
fn fatal(err: &anyhow::Error) {
    match err.downcast_ref::<ConfigError>() {
        Some(config) if config.field().is_some() => {
            error!(field = config.field().unwrap_or_default(), "fatal: {config}");
        }
        Some(config) if config.is_decode() => {
            error!("fatal: could not decode configuration: {config}");
        }
        _ => error!("fatal: {err:#}"),
    }
}
