//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install logging
//! - Build the forge client and delegate to command handlers
//!
//! Logging goes to stderr so stdout carries only results.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::{Context as _, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::forge::github::GitHubForge;

/// Log filter used when neither `RUST_LOG` nor the config file sets one.
pub const DEFAULT_LOG_FILTER: &str = "hubkit=info";

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    match &cli.command {
        Command::Tools => {
            init_tracing(cli.debug, None);
            commands::tools()
        }
        Command::Call { name, args } => {
            let forge = connect(&cli)?;
            runtime()?.block_on(commands::call(&forge, name, args.clone()))
        }
        Command::Serve => {
            let forge = connect(&cli)?;
            runtime()?.block_on(commands::serve(
                &forge,
                tokio::io::BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            ))
        }
    }
}

/// Load configuration, install logging and build the GitHub client.
fn connect(cli: &Cli) -> Result<GitHubForge> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(base) = &cli.api_base {
        config.override_api_base(base)?;
    }
    init_tracing(cli.debug, config.log());
    tracing::debug!(?config, "loaded configuration");

    GitHubForge::from_config(&config).context("failed to build GitHub client")
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}

/// Install the stderr subscriber.
///
/// `--debug` wins over everything; otherwise `RUST_LOG`, then the config
/// file's `log`, then [`DEFAULT_LOG_FILTER`].
fn init_tracing(debug: bool, configured: Option<&str>) {
    let filter = if debug {
        EnvFilter::new("hubkit=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or(DEFAULT_LOG_FILTER)))
    };

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
