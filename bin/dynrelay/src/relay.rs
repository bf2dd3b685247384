use anyhow::{Context as _, Error as GenericError};
use dynrelay_core::{
    host::{Endpoints, InputEndpoint, StreamStatus},
    stats::{BatchStats, StreamedStats},
    ParamValue, RelayComponent,
};
use tracing::{debug, warn};

use crate::{
    cli::Mode,
    host::{open_input, open_output, ProcessHost},
};

/// Statistics returned by a finished relay.
#[derive(Clone, Debug, PartialEq)]
pub enum RelayOutcome {
    /// Outcome of a batch run.
    Batch(BatchStats),

    /// Outcome of a streamed relay.
    Streamed(StreamedStats),
}

/// Where and how to relay.
pub struct RelayPlan<'a> {
    pub inputs: &'a [String],
    pub outputs: &'a [String],
    pub mode: Mode,
    pub chunk_size: usize,
}

/// Configures a relay from `params` and drives it according to `plan`.
///
/// # Errors
///
/// If an endpoint cannot be opened, the parameters are not a mapping, or the relay fails, an error is returned.
pub async fn run_relay(params: &ParamValue, plan: RelayPlan<'_>) -> Result<RelayOutcome, GenericError> {
    let mut inputs = Vec::with_capacity(plan.inputs.len());
    for path in plan.inputs {
        inputs.push(open_input(path).await?);
    }

    let mut endpoints = Endpoints::new();
    for path in plan.outputs {
        endpoints = endpoints.with_boxed_output(open_output(path).await?);
    }

    debug!(mode = ?plan.mode, inputs = inputs.len(), outputs = endpoints.output_count(), "Opened endpoints.");

    match plan.mode {
        Mode::Batch => {
            for input in inputs {
                endpoints = endpoints.with_boxed_input(input);
            }

            let mut component = RelayComponent::configure(params, ProcessHost::new(endpoints))
                .context("Failed to configure relay.")?;
            let stats = component.run().await.context("Batch relay failed.")?;
            component.host_mut().flush_outputs().await;

            Ok(RelayOutcome::Batch(stats))
        }
        Mode::Streamed => {
            let mut component = RelayComponent::configure(params, ProcessHost::new(endpoints))
                .context("Failed to configure relay.")?;
            let stats = stream_inputs(&mut component, &mut inputs, plan.chunk_size).await?;
            component.host_mut().flush_outputs().await;

            Ok(RelayOutcome::Streamed(stats))
        }
    }
}

/// Reads every input in chunks of at most `chunk_size` bytes, pushing each chunk to the relay, and then finishes the
/// stream.
///
/// A failed read ends the input it came from, and marks the stream as having completed with an error.
async fn stream_inputs(
    component: &mut RelayComponent<ProcessHost>, inputs: &mut [Box<dyn InputEndpoint>], chunk_size: usize,
) -> Result<StreamedStats, GenericError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(chunk_size)
        .with_context(|| format!("Failed to allocate chunk buffer of {} bytes.", chunk_size))?;
    buf.resize(chunk_size, 0);

    let mut status = StreamStatus::Completed;
    for input in inputs.iter_mut() {
        loop {
            let n = match input.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!(input = input.name(), error = %e, "Failed to read from input. Skipping rest of input.");
                    status = StreamStatus::Error;
                    break;
                }
            };

            component
                .on_chunk_written(input.name(), &buf[..n])
                .await
                .context("Failed to relay chunk.")?;
        }
    }

    let stream_id = inputs.iter().map(|input| input.name()).collect::<Vec<_>>().join(",");
    let stats = component
        .on_stream_finished(&stream_id, status)
        .context("Failed to finish stream.")?;

    Ok(stats)
}
