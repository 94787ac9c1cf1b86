//! Synergia - chat API backend
//!
//! Main entry point for the Synergia CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

mod commands;

use commands::{config, serve};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Synergia - chat API backend
#[derive(Parser)]
#[command(name = "synergia")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file layered on top of the discovered ones
    #[arg(short, long, global = true, env = "SYNERGIA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve(serve::ServeArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = synergia_config::load_config(None, cli.config.as_deref())?;
    let _guard = init_tracing(cli.verbose, &loaded.config.logging());

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        loaded,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Console (human-readable) + daily-rolling JSON file.
///
/// `RUST_LOG` replaces the console filter when set. The returned guard must
/// live until exit so buffered file output is flushed.
fn init_tracing(
    verbose: bool,
    logging: &synergia_config::LoggingConfig,
) -> Option<WorkerGuard> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let default_filter = if verbose {
        "synergia=debug,synergia_server=debug,synergia_session=debug,synergia_domain=debug,synergia_store=debug,synergia_config=debug,tower_http=debug,info"
    } else {
        "synergia=info,synergia_server=info,synergia_session=info,synergia_domain=info,synergia_store=info,warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(console_filter);

    let appender = logging
        .file_enabled
        .then(|| logging.log_dir())
        .flatten()
        .and_then(|dir| {
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("synergia")
                .filename_suffix("log")
                .build(&dir)
                .map_err(|e| eprintln!("warning: file logging disabled ({}): {}", dir.display(), e))
                .ok()
        });

    let (file, guard) = match appender {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(
                    "synergia=trace,synergia_server=trace,synergia_session=trace,synergia_domain=debug,synergia_store=debug,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}
