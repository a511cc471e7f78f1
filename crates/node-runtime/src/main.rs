//! # Star Log Client
//!
//! Entry point of the `starlog` binary.
//!
//! ## Startup
//!
//! 1. Parse the command line
//! 2. Install logging (`RUST_LOG`, else `info`, or `debug` with `--verbose`)
//! 3. Load configuration: defaults, then `SL_*` variables, then flags
//! 4. Open the ledger snapshot and wire the subsystems
//! 5. Run the command and print its output
//!
//! Ctrl-C during `probe` stops the nonce search at the next check interval.

use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::handlers;
use node_runtime::{Cli, LiveContainer, NodeConfig};

fn init_tracing(verbose: bool) -> Result<()> {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose)?;

    let config = NodeConfig::from_env().with_data_dir(cli.data_dir);
    debug!("Configuration: {:?}", config);

    let container = LiveContainer::open(config)?;

    let cancel = container.probe.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping at the next check interval");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let output = handlers::execute(&container, cli.command).await?;
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
