use std::path::Path;

use anyhow::{Context as _, Error as GenericError};
use dynrelay_core::{
    host::{CompletionStatus, Endpoints, Host, InputEndpoint, OutputEndpoint},
    io::{ReaderInput, WriterOutput},
    stats::StatsReport,
};
use tokio::{
    fs::File,
    io::{stdin, stdout, BufWriter},
};
use tracing::{debug, info, warn};

const STDIO: &str = "-";

/// Opens an input endpoint for the given path, where `-` means standard input.
///
/// # Errors
///
/// If the file cannot be opened, an error is returned.
pub async fn open_input(path: &str) -> Result<Box<dyn InputEndpoint>, GenericError> {
    if path == STDIO {
        return Ok(Box::new(ReaderInput::new("stdin", stdin())));
    }

    let file = File::open(Path::new(path))
        .await
        .with_context(|| format!("Failed to open input '{}'.", path))?;
    Ok(Box::new(ReaderInput::new(path, file)))
}

/// Opens an output endpoint for the given path, where `-` means standard output.
///
/// Files are created if missing, and truncated otherwise.
///
/// # Errors
///
/// If the file cannot be created, an error is returned.
pub async fn open_output(path: &str) -> Result<Box<dyn OutputEndpoint>, GenericError> {
    if path == STDIO {
        return Ok(Box::new(WriterOutput::new("stdout", BufWriter::new(stdout()))));
    }

    let file = File::create(Path::new(path))
        .await
        .with_context(|| format!("Failed to create output '{}'.", path))?;
    Ok(Box::new(WriterOutput::new(path, BufWriter::new(file))))
}

/// A host backed by the local process.
///
/// Lifecycle notifications are logged, and throughput reports are written to standard error.
pub struct ProcessHost {
    endpoints: Endpoints,
    running: bool,
}

impl ProcessHost {
    /// Creates a new `ProcessHost` driving the given endpoints.
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            running: false,
        }
    }

    /// Flushes every output endpoint.
    ///
    /// A failed flush is logged, and does not stop the remaining outputs from being flushed.
    pub async fn flush_outputs(&mut self) {
        for output in self.endpoints.outputs_mut() {
            if let Err(e) = output.flush().await {
                warn!(output = output.name(), error = %e, "Failed to flush output.");
            }
        }
    }
}

impl Host for ProcessHost {
    fn notify_running(&mut self) {
        if !self.running {
            self.running = true;
            info!("Relay running.");
        }
    }

    fn notify_finished(&mut self, status: CompletionStatus) {
        info!(?status, "Relay finished.");
    }

    fn endpoints(&mut self) -> &mut Endpoints {
        &mut self.endpoints
    }

    fn emit_report(&mut self, report: &StatsReport) {
        debug!("Emitting throughput report.");
        eprintln!("{}", report);
    }
}
