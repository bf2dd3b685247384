//! Relay statistics and throughput reports.

use std::fmt;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;
const MICROS_PER_SECOND: f64 = 1_000_000.0;

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}

/// A throughput figure, in megabytes per second.
///
/// Throughput measured over a zero duration is undefined, and is rendered as `inf` rather than dividing by zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Throughput(Option<f64>);

impl Throughput {
    /// Computes the throughput of moving `bytes` bytes in `micros` microseconds.
    pub fn from_bytes(bytes: u64, micros: u64) -> Self {
        if micros == 0 {
            return Self(None);
        }

        Self(Some(megabytes(bytes) / (micros as f64 / MICROS_PER_SECOND)))
    }

    /// Returns the throughput in megabytes per second, or `None` if it was measured over a zero duration.
    pub fn as_mb_per_sec(&self) -> Option<f64> {
        self.0
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(rate) => write!(f, "{:.3}", rate),
            None => f.write_str("inf"),
        }
    }
}

/// Statistics for a relay driven by streamed chunks.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StreamedStats {
    /// Total number of bytes relayed.
    pub total_bytes: u64,

    /// Total time spent writing to outputs, in microseconds.
    pub write_duration_micros: u64,

    /// Number of outputs written to.
    pub outputs: usize,

    /// Number of output writes that failed.
    pub write_errors: u64,
}

impl StreamedStats {
    /// Returns the write throughput.
    pub fn write_throughput(&self) -> Throughput {
        Throughput::from_bytes(self.total_bytes, self.write_duration_micros)
    }
}

/// Statistics for a single batch run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchStats {
    /// Size of the transfer buffer, in bytes.
    pub buffer_size: usize,

    /// Total number of bytes read from inputs, and written to each output.
    pub total_bytes: u64,

    /// Total time spent reading from inputs, in microseconds.
    pub read_duration_micros: u64,

    /// Total time spent writing to outputs, in microseconds.
    pub write_duration_micros: u64,

    /// Number of inputs read from.
    pub inputs: usize,

    /// Number of outputs written to.
    pub outputs: usize,

    /// Number of input reads that failed.
    pub read_errors: u64,

    /// Number of output writes that failed.
    pub write_errors: u64,
}

impl BatchStats {
    /// Returns the read throughput.
    pub fn read_throughput(&self) -> Throughput {
        Throughput::from_bytes(self.total_bytes, self.read_duration_micros)
    }

    /// Returns the write throughput.
    pub fn write_throughput(&self) -> Throughput {
        Throughput::from_bytes(self.total_bytes, self.write_duration_micros)
    }

    /// Returns the overall copy throughput, counting both read and write time.
    pub fn copy_throughput(&self) -> Throughput {
        let duration = self.read_duration_micros.saturating_add(self.write_duration_micros);
        Throughput::from_bytes(self.total_bytes, duration)
    }
}

/// A human-readable throughput report.
#[derive(Clone, Debug, PartialEq)]
pub enum StatsReport {
    /// Report for a relay driven by streamed chunks.
    Streamed(StreamedStats),

    /// Report for a batch run.
    Batch(BatchStats),
}

impl StatsReport {
    /// Renders the report as individual lines.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Streamed(stats) => vec![format!(
                "Wrote {:.3} [MB] of data to {} outputs in {:.3} [ms] at {} [MB/s]",
                megabytes(stats.total_bytes),
                stats.outputs,
                stats.write_duration_micros as f64 / 1000.0,
                stats.write_throughput(),
            )],
            Self::Batch(stats) => {
                let total_mb = megabytes(stats.total_bytes);
                vec![
                    format!("Buffer size used for the transfer: {} bytes", stats.buffer_size),
                    format!(
                        "Read {:.3} [MB] of data from {} inputs at {} [MB/s]",
                        total_mb,
                        stats.inputs,
                        stats.read_throughput()
                    ),
                    format!(
                        "Wrote {:.3} [MB] of data to {} outputs at {} [MB/s]",
                        total_mb,
                        stats.outputs,
                        stats.write_throughput()
                    ),
                    format!("Copied {:.3} [MB] of data at {} [MB/s]", total_mb, stats.copy_throughput()),
                ]
            }
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}
