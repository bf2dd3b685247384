//! The relay engine.
//!
//! Two data paths move bytes from inputs to outputs: a streamed path, where the host pushes chunks as they arrive,
//! and a batch path, where the relay pulls from every input until each is exhausted.

use metrics::{counter, histogram, Counter, Histogram};
use quanta::Clock;
use tracing::warn;

use crate::{host::OutputEndpoint, timing::elapsed_micros};

pub(crate) mod batch;
pub(crate) mod streamed;

pub(crate) struct Telemetry {
    bytes_relayed: Counter,
    read_errors: Counter,
    write_errors: Counter,
    write_duration: Histogram,
}

impl Telemetry {
    pub(crate) fn new() -> Self {
        Self {
            bytes_relayed: counter!("dynrelay_bytes_relayed_total"),
            read_errors: counter!("dynrelay_read_errors_total"),
            write_errors: counter!("dynrelay_write_errors_total"),
            write_duration: histogram!("dynrelay_write_duration_seconds"),
        }
    }
}

/// Outcome of writing one chunk to every output.
pub(crate) struct FanOut {
    pub duration_micros: u64,
    pub errors: u64,
}

/// Writes `data` to every output, in order, timing the whole write phase.
///
/// A failed write is logged and counted, and does not stop the remaining outputs from being written.
pub(crate) async fn write_to_outputs(
    outputs: &mut [Box<dyn OutputEndpoint>], data: &[u8], clock: &Clock, telemetry: &Telemetry,
) -> FanOut {
    let mut errors = 0;

    let start = clock.now();
    for output in outputs.iter_mut() {
        if let Err(e) = output.write(data).await {
            warn!(output = output.name(), error = %e, "Failed to write to output.");
            errors += 1;
        }
    }
    let duration_micros = elapsed_micros(start, clock.now());

    telemetry.bytes_relayed.increment(data.len() as u64);
    telemetry.write_errors.increment(errors);
    telemetry.write_duration.record(duration_micros as f64 / 1_000_000.0);

    FanOut {
        duration_micros,
        errors,
    }
}
