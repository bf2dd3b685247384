use std::{
    collections::TryReserveError,
    ops::{Deref, DerefMut},
};

use bytesize::ByteSize;
use quanta::Clock;
use tracing::{debug, warn};

use super::{write_to_outputs, Telemetry};
use crate::{host::Endpoints, state::RelayState, stats::BatchStats, timing::elapsed_micros};

/// A transfer buffer.
///
/// Allocated up front, and released when dropped.
pub(crate) struct TransferBuffer(Vec<u8>);

impl TransferBuffer {
    /// Allocates a zeroed transfer buffer of exactly `size` bytes.
    ///
    /// # Errors
    ///
    /// If the allocation fails, an error is returned.
    pub(crate) fn allocate(size: usize) -> Result<Self, TryReserveError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)?;
        buf.resize(size, 0);
        Ok(Self(buf))
    }
}

impl Deref for TransferBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl DerefMut for TransferBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// Pulls every input until it is exhausted, relaying everything read to every output.
///
/// Inputs are drained one after the other, in order. A failed read ends the input it came from.
///
/// # Errors
///
/// If the transfer buffer cannot be allocated, an error is returned and no I/O is performed.
pub(crate) async fn relay_all(
    state: &mut RelayState, endpoints: &mut Endpoints, clock: &Clock, telemetry: &Telemetry,
) -> Result<BatchStats, TryReserveError> {
    let buffer_size = state.configuration().buffer_size;
    let mut buf = TransferBuffer::allocate(buffer_size)?;

    let mut stats = BatchStats {
        buffer_size,
        inputs: endpoints.input_count(),
        outputs: endpoints.output_count(),
        ..BatchStats::default()
    };

    debug!(
        buffer_size = %ByteSize(buffer_size as u64),
        inputs = stats.inputs,
        outputs = stats.outputs,
        "Starting batch relay."
    );

    let (inputs, outputs) = endpoints.split_mut();
    for input in inputs.iter_mut() {
        loop {
            let start = clock.now();
            let result = input.read(&mut buf[..]).await;
            stats.read_duration_micros = stats
                .read_duration_micros
                .saturating_add(elapsed_micros(start, clock.now()));

            let n = match result {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!(input = input.name(), error = %e, "Failed to read from input. Skipping rest of input.");
                    telemetry.read_errors.increment(1);
                    stats.read_errors += 1;
                    break;
                }
            };

            let fan_out = write_to_outputs(outputs, &buf[..n], clock, telemetry).await;
            state.record_relayed(n as u64, fan_out.duration_micros, fan_out.errors);

            stats.total_bytes = stats.total_bytes.saturating_add(n as u64);
            stats.write_duration_micros = stats.write_duration_micros.saturating_add(fan_out.duration_micros);
            stats.write_errors += fan_out.errors;
        }

        debug!(input = input.name(), "Input exhausted.");
    }

    Ok(stats)
}
