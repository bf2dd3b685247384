use std::time::Duration;

use dynrelay_params::{resolve, Diagnostic, ParamValue, RelayConfiguration};
use quanta::Clock;
use snafu::ResultExt as _;
use tracing::{debug, info};

use crate::{
    engine::{batch, streamed, Telemetry},
    errors::{AlreadyFinished, BufferAllocation, InvalidParameters, RelayError},
    fault::simulate_fatal_fault,
    host::{CompletionStatus, Host, StreamStatus},
    state::RelayState,
    stats::{BatchStats, StatsReport, StreamedStats},
};

/// Lifecycle phase of a relay.
///
/// A relay only exists once it has been configured, so there is no unconfigured phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// The relay has been configured, but has not yet relayed anything.
    Configured,

    /// The relay has started relaying.
    Running,

    /// The relay has finished. No further calls are accepted.
    Finished,
}

/// A relay component.
///
/// Created by [`configure`][Self::configure], and then driven by the host either with streamed chunks
/// ([`on_chunk_written`][Self::on_chunk_written], followed by [`on_stream_finished`][Self::on_stream_finished]) or with
/// a single batch [`run`][Self::run].
pub struct RelayComponent<H> {
    host: H,
    phase: Phase,
    state: Option<RelayState>,
    diagnostics: Vec<Diagnostic>,
    clock: Clock,
    telemetry: Telemetry,
}

impl<H: Host> RelayComponent<H> {
    /// Configures a new relay from loosely-typed parameters.
    ///
    /// Entries that cannot be used are skipped, and are available afterwards via [`diagnostics`][Self::diagnostics].
    ///
    /// # Errors
    ///
    /// If `params` is not a mapping, an error is returned and no relay is created.
    pub fn configure(params: &ParamValue, host: H) -> Result<Self, RelayError> {
        let resolution = resolve(params).context(InvalidParameters)?;

        let mut component = Self::from_configuration(resolution.configuration, host);
        component.diagnostics = resolution.diagnostics;
        Ok(component)
    }

    /// Creates a new relay from an already-typed configuration.
    pub fn from_configuration(configuration: RelayConfiguration, host: H) -> Self {
        debug!(?configuration, "Relay configured.");

        Self {
            host,
            phase: Phase::Configured,
            state: Some(RelayState::new(configuration)),
            diagnostics: Vec::new(),
            clock: Clock::new(),
            telemetry: Telemetry::new(),
        }
    }

    /// Sets the clock used to time reads and writes.
    ///
    /// Mostly useful for tests, where a mocked clock makes durations deterministic.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the relay configuration, or `None` if the relay has finished.
    pub fn configuration(&self) -> Option<&RelayConfiguration> {
        self.state.as_ref().map(|state| state.configuration())
    }

    /// Returns the diagnostics produced while resolving the parameters.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns a reference to the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns a mutable reference to the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the relay, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }

    fn active_state(&mut self) -> Result<&mut RelayState, RelayError> {
        match self.state.as_mut() {
            Some(state) if self.phase != Phase::Finished => Ok(state),
            _ => AlreadyFinished.fail(),
        }
    }

    fn mark_running(&mut self) {
        if self.phase == Phase::Configured {
            debug!("Relay running.");
            self.phase = Phase::Running;
        }
        self.host.notify_running();
    }

    /// Transitions to `Finished`, releasing the instance state.
    ///
    /// This is the only place the instance state is released.
    fn finish(&mut self) -> Option<RelayState> {
        self.phase = Phase::Finished;
        self.state.take()
    }

    /// Relays a chunk pushed by the host to every output.
    ///
    /// # Errors
    ///
    /// If the relay has already finished, an error is returned.
    pub async fn on_chunk_written(&mut self, stream_id: &str, data: &[u8]) -> Result<(), RelayError> {
        self.active_state()?;
        self.mark_running();

        let Self {
            host,
            state,
            clock,
            telemetry,
            ..
        } = self;
        let state = state.as_mut().ok_or(RelayError::AlreadyFinished)?;
        let outputs = host.endpoints().outputs_mut();
        streamed::relay_chunk(state, outputs, stream_id, data, clock, telemetry).await;

        Ok(())
    }

    /// Finishes a relay driven by streamed chunks.
    ///
    /// Emits the throughput report if configured to, signals the host that the relay has finished, and releases the
    /// instance state.
    ///
    /// # Errors
    ///
    /// If the relay has already finished, an error is returned.
    pub fn on_stream_finished(&mut self, stream_id: &str, status: StreamStatus) -> Result<StreamedStats, RelayError> {
        self.active_state()?;
        debug!(stream_id, ?status, "Input stream finished.");

        let outputs = self.host.endpoints().output_count();
        let state = self.finish().ok_or(RelayError::AlreadyFinished)?;
        let stats = StreamedStats {
            total_bytes: state.total_bytes(),
            write_duration_micros: state.write_duration_micros(),
            outputs,
            write_errors: state.write_errors(),
        };

        if state.configuration().print_stats {
            self.host.emit_report(&StatsReport::Streamed(stats.clone()));
        }
        self.host.notify_finished(CompletionStatus::Finished);

        Ok(stats)
    }

    /// Runs the relay in batch mode, pulling every input until it is exhausted.
    ///
    /// If configured to crash, the process is killed before anything else happens. Otherwise, after the configured
    /// delay, every input is drained in order and everything read is written to every output. The relay is finished
    /// once this returns successfully. Signalling overall completion upstream is left to the host.
    ///
    /// # Errors
    ///
    /// If the relay has already finished, or the transfer buffer cannot be allocated, an error is returned. In the
    /// latter case, no I/O is performed and the relay's counters are left untouched.
    pub async fn run(&mut self) -> Result<BatchStats, RelayError> {
        let configuration = self.active_state()?.configuration().clone();

        if configuration.crash_and_burn {
            simulate_fatal_fault();
        }

        self.mark_running();

        if configuration.sleep_seconds > 0 {
            info!(sleep_seconds = configuration.sleep_seconds, "Delaying batch run.");
            tokio::time::sleep(Duration::from_secs(configuration.sleep_seconds)).await;
        }

        let Self {
            host,
            state,
            clock,
            telemetry,
            ..
        } = self;
        let state = state.as_mut().ok_or(RelayError::AlreadyFinished)?;
        let stats = batch::relay_all(state, host.endpoints(), clock, telemetry)
            .await
            .context(BufferAllocation {
                size: configuration.buffer_size,
            })?;

        self.finish();

        if configuration.print_stats {
            self.host.emit_report(&StatsReport::Batch(stats.clone()));
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command;

    use similar_asserts::assert_eq;

    use super::*;
    use crate::{
        host::Endpoints,
        test_util::{FailingInput, FailingOutput, MemoryInput, MemoryOutput, TestHost},
    };

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn config(print_stats: bool, buffer_size: usize) -> RelayConfiguration {
        RelayConfiguration {
            print_stats,
            buffer_size,
            ..RelayConfiguration::default()
        }
    }

    #[test]
    fn configure_rejects_non_mapping() {
        let result = RelayComponent::configure(&ParamValue::Integer(7), TestHost::new(Endpoints::new()));
        assert!(matches!(result, Err(RelayError::InvalidParameters { .. })));
    }

    #[test]
    fn configure_keeps_diagnostics() {
        let params = ParamValue::from_iter([("bufsize", ParamValue::from("big")), ("print_stats", 1i64.into())]);
        let component = RelayComponent::configure(&params, TestHost::new(Endpoints::new())).unwrap();

        assert_eq!(component.phase(), Phase::Configured);
        assert_eq!(component.diagnostics().len(), 1);
        let configuration = component.configuration().unwrap();
        assert_eq!(configuration.buffer_size, dynrelay_params::DEFAULT_BUFFER_SIZE);
        assert!(configuration.print_stats);
    }

    #[tokio::test]
    async fn batch_run_mirrors_input_to_every_output() {
        let data = pattern(150_000);
        let (first, first_probe) = MemoryOutput::new("out-1");
        let (second, second_probe) = MemoryOutput::new("out-2");
        let endpoints = Endpoints::new()
            .with_input(MemoryInput::new("in", data.clone()))
            .with_output(first)
            .with_output(second);

        let mut component = RelayComponent::from_configuration(config(false, 4096), TestHost::new(endpoints));
        let stats = component.run().await.unwrap();

        assert_eq!(stats.total_bytes, data.len() as u64);
        assert_eq!(stats.inputs, 1);
        assert_eq!(stats.outputs, 2);
        assert_eq!(first_probe.contents(), data);
        assert_eq!(second_probe.contents(), data);
        assert!(first_probe.writes().iter().all(|w| w.len() <= 4096));
        assert_eq!(component.phase(), Phase::Finished);
        assert!(component.configuration().is_none());

        let host = component.into_host();
        assert!(host.running());
        assert!(host.finished().is_empty());
        assert!(host.reports().is_empty());
    }

    #[tokio::test]
    async fn batch_run_drains_inputs_in_order() {
        let (output, probe) = MemoryOutput::new("out");
        let endpoints = Endpoints::new()
            .with_input(MemoryInput::new("a", b"first-".to_vec()))
            .with_input(MemoryInput::new("b", Vec::new()))
            .with_input(MemoryInput::new("c", b"second".to_vec()))
            .with_output(output);

        let mut component = RelayComponent::from_configuration(config(false, 3), TestHost::new(endpoints));
        let stats = component.run().await.unwrap();

        assert_eq!(stats.total_bytes, 12);
        assert_eq!(stats.inputs, 3);
        assert_eq!(probe.contents(), b"first-second".to_vec());
        assert_eq!(
            probe.writes(),
            vec![b"fir".to_vec(), b"st-".to_vec(), b"sec".to_vec(), b"ond".to_vec()]
        );
    }

    #[tokio::test]
    async fn batch_run_without_inputs() {
        let (output, probe) = MemoryOutput::new("out");
        let endpoints = Endpoints::new().with_output(output);

        let mut component = RelayComponent::from_configuration(config(false, 1024), TestHost::new(endpoints));
        let stats = component.run().await.unwrap();

        assert_eq!(stats.total_bytes, 0);
        assert!(probe.writes().is_empty());
    }

    #[tokio::test]
    async fn batch_report_carries_buffer_size() {
        let (clock, mock) = Clock::mock();
        let (output, _probe) = MemoryOutput::new("out");
        let endpoints = Endpoints::new()
            .with_input(MemoryInput::new("in", pattern(10_000)))
            .with_output(output.advancing(mock, Duration::from_millis(2)));

        let mut component =
            RelayComponent::from_configuration(config(true, 12_345), TestHost::new(endpoints)).with_clock(clock);
        let stats = component.run().await.unwrap();

        assert_eq!(stats.read_duration_micros, 0);
        assert_eq!(stats.write_duration_micros, 2_000);

        let host = component.into_host();
        let reports = host.reports();
        assert_eq!(reports.len(), 1);
        let StatsReport::Batch(reported) = &reports[0] else {
            panic!("expected a batch report");
        };
        assert_eq!(reported.buffer_size, 12_345);

        let lines = reports[0].lines();
        assert_eq!(lines[0], "Buffer size used for the transfer: 12345 bytes");
        // Reads take no mocked time.
        assert!(lines[1].ends_with("at inf [MB/s]"));
    }

    #[tokio::test]
    async fn batch_run_buffer_allocation_failure() {
        let (output, probe) = MemoryOutput::new("out");
        let endpoints = Endpoints::new()
            .with_input(MemoryInput::new("in", pattern(100)))
            .with_output(output);

        let mut component = RelayComponent::from_configuration(config(true, usize::MAX), TestHost::new(endpoints));
        let err = component.run().await.unwrap_err();

        assert!(matches!(err, RelayError::BufferAllocation { size: usize::MAX, .. }));
        assert!(probe.writes().is_empty());
        assert_ne!(component.phase(), Phase::Finished);
        assert!(component.host().reports().is_empty());
    }

    #[tokio::test]
    async fn batch_run_survives_endpoint_failures() {
        let (output, probe) = MemoryOutput::new("good");
        let endpoints = Endpoints::new()
            .with_input(FailingInput::new("broken"))
            .with_input(MemoryInput::new("in", b"payload".to_vec()))
            .with_output(FailingOutput::new("bad"))
            .with_output(output);

        let mut component = RelayComponent::from_configuration(config(false, 64), TestHost::new(endpoints));
        let stats = component.run().await.unwrap();

        assert_eq!(stats.read_errors, 1);
        assert_eq!(stats.write_errors, 1);
        assert_eq!(stats.total_bytes, 7);
        assert_eq!(probe.contents(), b"payload".to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn batch_run_sleeps_before_io() {
        let (output, probe) = MemoryOutput::new("out");
        let endpoints = Endpoints::new()
            .with_input(MemoryInput::new("in", b"late".to_vec()))
            .with_output(output);
        let configuration = RelayConfiguration {
            sleep_seconds: 3,
            ..RelayConfiguration::default()
        };

        let started = tokio::time::Instant::now();
        let mut component = RelayComponent::from_configuration(configuration, TestHost::new(endpoints));
        component.run().await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(probe.contents(), b"late".to_vec());
    }

    #[tokio::test]
    async fn streamed_chunks_are_relayed_in_order() {
        let (clock, mock) = Clock::mock();
        let (first, first_probe) = MemoryOutput::new("out-1");
        let (second, second_probe) = MemoryOutput::new("out-2");
        let endpoints = Endpoints::new()
            .with_output(first.advancing(mock.clone(), Duration::from_millis(1)))
            .with_output(second.advancing(mock, Duration::from_millis(1)));

        let mut component =
            RelayComponent::from_configuration(config(true, 1024), TestHost::new(endpoints)).with_clock(clock);

        let chunks = [pattern(10), pattern(20), pattern(30)];
        for chunk in &chunks {
            component.on_chunk_written("upstream", chunk).await.unwrap();
            assert_eq!(component.phase(), Phase::Running);
        }
        let stats = component.on_stream_finished("upstream", StreamStatus::Completed).unwrap();

        assert_eq!(stats.total_bytes, 60);
        assert_eq!(stats.outputs, 2);
        assert_eq!(stats.write_duration_micros, 6_000);
        assert_eq!(first_probe.writes(), chunks.to_vec());
        assert_eq!(second_probe.writes(), chunks.to_vec());
        assert_eq!(component.phase(), Phase::Finished);

        let host = component.into_host();
        assert_eq!(host.finished(), vec![CompletionStatus::Finished]);
        assert_eq!(host.running_notifications(), 3);
        assert_eq!(host.reports(), vec![StatsReport::Streamed(stats)]);
    }

    #[tokio::test]
    async fn stream_finished_without_chunks() {
        let mut component = RelayComponent::from_configuration(config(false, 1024), TestHost::new(Endpoints::new()));
        let stats = component.on_stream_finished("upstream", StreamStatus::Error).unwrap();

        assert_eq!(stats, StreamedStats::default());
        let host = component.into_host();
        assert!(!host.running());
        assert_eq!(host.finished(), vec![CompletionStatus::Finished]);
    }

    #[tokio::test]
    async fn finished_is_terminal() {
        let (output, probe) = MemoryOutput::new("out");
        let endpoints = Endpoints::new().with_output(output);
        let mut component = RelayComponent::from_configuration(config(false, 1024), TestHost::new(endpoints));

        component.on_chunk_written("upstream", b"abc").await.unwrap();
        component.on_stream_finished("upstream", StreamStatus::Completed).unwrap();

        assert!(matches!(
            component.on_chunk_written("upstream", b"def").await,
            Err(RelayError::AlreadyFinished)
        ));
        assert!(matches!(
            component.on_stream_finished("upstream", StreamStatus::Completed),
            Err(RelayError::AlreadyFinished)
        ));
        assert!(matches!(component.run().await, Err(RelayError::AlreadyFinished)));

        assert_eq!(probe.contents(), b"abc".to_vec());
        assert_eq!(component.host().finished().len(), 1);
    }

    const CRASH_CHILD_ENV: &str = "DYNRELAY_CRASH_TEST_CHILD";
    const FINISHED_MARKER: &str = "relay reported finished";

    #[test]
    fn crash_and_burn_kills_the_process() {
        if std::env::var_os(CRASH_CHILD_ENV).is_some() {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let params = ParamValue::from_iter([("crash_and_burn", true)]);
                let endpoints = Endpoints::new().with_input(MemoryInput::new("in", pattern(10)));
                let mut component = RelayComponent::configure(&params, TestHost::new(endpoints)).unwrap();
                let _ = component.run().await;
                if !component.host().finished().is_empty() {
                    println!("{}", FINISHED_MARKER);
                }
            });
            // Reaching this point means the fault was not injected.
            std::process::exit(0);
        }

        let output = Command::new(std::env::current_exe().unwrap())
            .args([
                "--exact",
                "component::tests::crash_and_burn_kills_the_process",
                "--nocapture",
                "--test-threads=1",
            ])
            .env(CRASH_CHILD_ENV, "1")
            .output()
            .unwrap();

        assert!(!output.status.success());
        assert!(!String::from_utf8_lossy(&output.stdout).contains(FINISHED_MARKER));

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt as _;
            assert_eq!(output.status.signal(), Some(libc::SIGKILL));
        }
    }
}
