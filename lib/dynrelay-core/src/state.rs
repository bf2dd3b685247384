use dynrelay_params::RelayConfiguration;

/// Per-instance relay state.
///
/// Counters only ever increase over the lifetime of an instance.
#[derive(Debug)]
pub struct RelayState {
    configuration: RelayConfiguration,
    total_bytes: u64,
    write_duration_micros: u64,
    write_errors: u64,
}

impl RelayState {
    /// Creates a new `RelayState` for the given configuration.
    pub fn new(configuration: RelayConfiguration) -> Self {
        Self {
            configuration,
            total_bytes: 0,
            write_duration_micros: 0,
            write_errors: 0,
        }
    }

    /// Returns the relay configuration.
    pub fn configuration(&self) -> &RelayConfiguration {
        &self.configuration
    }

    /// Returns the total number of bytes relayed.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Returns the total time spent writing to outputs, in microseconds.
    pub fn write_duration_micros(&self) -> u64 {
        self.write_duration_micros
    }

    /// Returns the number of output writes that failed.
    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    pub(crate) fn record_relayed(&mut self, bytes: u64, write_duration_micros: u64, write_errors: u64) {
        self.total_bytes = self.total_bytes.saturating_add(bytes);
        self.write_duration_micros = self.write_duration_micros.saturating_add(write_duration_micros);
        self.write_errors = self.write_errors.saturating_add(write_errors);
    }
}
