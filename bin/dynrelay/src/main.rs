//! Standalone relay harness.
//!
//! Drives a relay against files and standard I/O, either as a single batch run or by pushing input to it chunk by
//! chunk, so that relays can be exercised outside of a dataflow engine.

#![deny(warnings)]
#![deny(missing_docs)]

use anyhow::Error as GenericError;
use clap::Parser as _;
use tracing::{error, info};

mod cli;
use self::cli::Cli;

mod host;

mod logging;
use self::logging::{fatal_and_exit, initialize_logging};

mod params;
use self::params::load_params;

mod relay;
use self::relay::{run_relay, RelayOutcome, RelayPlan};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(None) {
        fatal_and_exit(format!("failed to initialize logging: {}", e));
    }

    match run(cli).await {
        Ok(()) => info!("Relay stopped."),
        Err(e) => {
            error!("{:?}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<(), GenericError> {
    let params = load_params(cli.params.as_deref(), &cli.overrides)?;

    let plan = RelayPlan {
        inputs: &cli.inputs,
        outputs: &cli.outputs,
        mode: cli.mode,
        chunk_size: cli.chunk_size as usize,
    };

    match run_relay(&params, plan).await? {
        RelayOutcome::Batch(stats) => info!(
            total_bytes = stats.total_bytes,
            read_errors = stats.read_errors,
            write_errors = stats.write_errors,
            "Batch relay complete."
        ),
        RelayOutcome::Streamed(stats) => info!(
            total_bytes = stats.total_bytes,
            write_errors = stats.write_errors,
            "Streamed relay complete."
        ),
    }

    Ok(())
}
