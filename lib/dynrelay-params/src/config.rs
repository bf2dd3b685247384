/// Default size of the transfer buffer, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Relay configuration.
///
/// Built once from the parameters handed over by the host, and never modified afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelayConfiguration {
    /// Whether or not to emit a throughput report when the relay finishes.
    ///
    /// Defaults to `false`.
    pub print_stats: bool,

    /// Whether or not to kill the process as soon as a batch run starts.
    ///
    /// This exists purely to exercise the host's failure handling.
    ///
    /// Defaults to `false`.
    pub crash_and_burn: bool,

    /// Size of the transfer buffer used by batch runs, in bytes.
    ///
    /// Defaults to 65536 (64 KiB).
    pub buffer_size: usize,

    /// Number of whole seconds to sleep before a batch run performs any I/O.
    ///
    /// Defaults to 0.
    pub sleep_seconds: u64,
}

impl Default for RelayConfiguration {
    fn default() -> Self {
        Self {
            print_stats: false,
            crash_and_burn: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            sleep_seconds: 0,
        }
    }
}
