//! # Relayer CLI
use crate::{
    config::{ProcessEnv, RelayerConfig},
    error::RelayError,
    listener::Listener,
};
use clap::{Parser, ValueEnum};
use std::io;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    Trace,
    Debug,
    Info,
    Warn,
}

impl From<Verbosity> for LevelFilter {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Trace => Self::TRACE,
            Verbosity::Debug => Self::DEBUG,
            Verbosity::Info => Self::INFO,
            Verbosity::Warn => Self::WARN,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Without a verbosity nothing is logged unless `RUST_LOG` says otherwise.
pub fn init_tracing(verbosity: Option<Verbosity>) {
    let level = verbosity.map(LevelFilter::from).unwrap_or(LevelFilter::OFF);
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::builder().with_default_directive(level.into()).from_env_lossy())
        .init();
}

/// The LayerZero relayer verifies, commits and executes packets between two chains.
#[derive(Debug, Parser)]
#[command(author, about = "LayerZero relayer", long_about = None)]
pub struct Args {
    /// Log verbosity. Silent when omitted.
    #[arg(value_enum, value_name = "LEVEL")]
    pub verbosity: Option<Verbosity>,
}

impl Args {
    /// Runs the relayer until interrupted or a relay fails.
    pub async fn run(self) -> eyre::Result<()> {
        // a missing .env file is fine, the variables may come from the environment
        dotenvy::dotenv().ok();
        init_tracing(self.verbosity);

        let config = RelayerConfig::from_env(&ProcessEnv)?;
        let listener = Listener::connect(config).await?;

        until_interrupted(listener.run(), tokio::signal::ctrl_c()).await
    }
}

/// Drives `relayer` until it fails or `interrupt` resolves. A failed signal handler is an
/// error.
async fn until_interrupted(
    relayer: impl Future<Output = Result<(), RelayError>>,
    interrupt: impl Future<Output = io::Result<()>>,
) -> eyre::Result<()> {
    tokio::select! {
        result = relayer => result?,
        result = interrupt => {
            result?;
            info!("Terminating...");
        }
    }

    Ok(())
}
