use std::collections::TryReserveError;

use dynrelay_params::ResolveError;
use snafu::Snafu;

/// A relay error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum RelayError {
    /// The relay parameters could not be resolved.
    #[snafu(display("Failed to resolve relay parameters."))]
    InvalidParameters {
        /// Error source.
        source: ResolveError,
    },

    /// The relay has already finished, and accepts no further calls.
    #[snafu(display("Relay has already finished."))]
    AlreadyFinished,

    /// The transfer buffer could not be allocated.
    #[snafu(display("Failed to allocate transfer buffer of {} bytes.", size))]
    BufferAllocation {
        /// Requested buffer size, in bytes.
        size: usize,

        /// Error source.
        source: TryReserveError,
    },
}
