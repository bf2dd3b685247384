use quanta::Clock;
use tracing::trace;

use super::{write_to_outputs, Telemetry};
use crate::{host::OutputEndpoint, state::RelayState};

/// Relays a single pushed chunk to every output.
///
/// The chunk is accounted for exactly once, after every output has been written.
pub(crate) async fn relay_chunk(
    state: &mut RelayState, outputs: &mut [Box<dyn OutputEndpoint>], stream_id: &str, data: &[u8], clock: &Clock,
    telemetry: &Telemetry,
) {
    trace!(stream_id, len = data.len(), "Relaying chunk.");

    let fan_out = write_to_outputs(outputs, data, clock, telemetry).await;
    state.record_relayed(data.len() as u64, fan_out.duration_micros, fan_out.errors);
}
