//! The contract between a relay and the host driving it.

use std::io;

use async_trait::async_trait;
use tracing::info;

use crate::stats::StatsReport;

/// Terminal status reported to the host when a relay finishes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompletionStatus {
    /// The relay finished normally.
    Finished,

    /// The relay finished with an error.
    Error,
}

/// Status of an upstream stream, as reported by the host when the stream completes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamStatus {
    /// The stream completed normally.
    Completed,

    /// The stream completed with an error.
    Error,
}

/// A readable input endpoint.
#[async_trait]
pub trait InputEndpoint: Send {
    /// Name of the endpoint.
    fn name(&self) -> &str;

    /// Reads up to `buf.len()` bytes into `buf`, returning the number of bytes read.
    ///
    /// A return value of zero signals that the input is exhausted.
    ///
    /// # Errors
    ///
    /// If the underlying transport fails, an error is returned.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A writable output endpoint.
#[async_trait]
pub trait OutputEndpoint: Send {
    /// Name of the endpoint.
    fn name(&self) -> &str;

    /// Writes all of `data` to the endpoint.
    ///
    /// # Errors
    ///
    /// If the underlying transport fails, an error is returned.
    async fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flushes any data buffered by the endpoint.
    ///
    /// # Errors
    ///
    /// If the underlying transport fails, an error is returned.
    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The ordered input and output endpoints wired to a relay by its host.
#[derive(Default)]
pub struct Endpoints {
    inputs: Vec<Box<dyn InputEndpoint>>,
    outputs: Vec<Box<dyn OutputEndpoint>>,
}

impl Endpoints {
    /// Creates an empty set of endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input endpoint.
    ///
    /// Inputs are drained in the order they were added.
    pub fn with_input<I>(mut self, input: I) -> Self
    where
        I: InputEndpoint + 'static,
    {
        self.inputs.push(Box::new(input));
        self
    }

    /// Adds an output endpoint.
    ///
    /// Outputs are written in the order they were added.
    pub fn with_output<O>(mut self, output: O) -> Self
    where
        O: OutputEndpoint + 'static,
    {
        self.outputs.push(Box::new(output));
        self
    }

    /// Adds an already-boxed input endpoint.
    pub fn with_boxed_input(mut self, input: Box<dyn InputEndpoint>) -> Self {
        self.inputs.push(input);
        self
    }

    /// Adds an already-boxed output endpoint.
    pub fn with_boxed_output(mut self, output: Box<dyn OutputEndpoint>) -> Self {
        self.outputs.push(output);
        self
    }

    /// Returns the number of input endpoints.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the number of output endpoints.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Returns mutable references to the output endpoints.
    pub fn outputs_mut(&mut self) -> &mut [Box<dyn OutputEndpoint>] {
        &mut self.outputs
    }

    /// Returns mutable references to both the input and output endpoints.
    pub fn split_mut(&mut self) -> (&mut [Box<dyn InputEndpoint>], &mut [Box<dyn OutputEndpoint>]) {
        (&mut self.inputs, &mut self.outputs)
    }
}

/// Capabilities provided by the host to a relay.
///
/// The host owns the endpoints and decides how they map to concrete transports. Calls into a relay are serialized by
/// the host, so implementations need no internal synchronization.
pub trait Host: Send {
    /// Signals that the relay is actively processing.
    ///
    /// May be called any number of times; only the first call is meaningful.
    fn notify_running(&mut self);

    /// Signals that the relay has finished.
    ///
    /// Called at most once per relay.
    fn notify_finished(&mut self, status: CompletionStatus);

    /// Returns the endpoints wired to the relay.
    fn endpoints(&mut self) -> &mut Endpoints;

    /// Emits a throughput report.
    ///
    /// Only called when the relay is configured to print statistics. Defaults to logging each line of the report.
    fn emit_report(&mut self, report: &StatsReport) {
        for line in report.lines() {
            info!("{}", line);
        }
    }
}
