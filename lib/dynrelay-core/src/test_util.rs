use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use quanta::Mock;

use crate::{
    host::{CompletionStatus, Endpoints, Host, InputEndpoint, OutputEndpoint},
    stats::StatsReport,
};

pub struct MemoryInput {
    name: String,
    data: Vec<u8>,
    pos: usize,
}

impl MemoryInput {
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            data,
            pos: 0,
        }
    }
}

#[async_trait]
impl InputEndpoint for MemoryInput {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

pub struct FailingInput {
    name: String,
}

impl FailingInput {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl InputEndpoint for FailingInput {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "input went away"))
    }
}

/// Inspects everything written to a [`MemoryOutput`] after it has been handed to a host.
#[derive(Clone, Default)]
pub struct OutputProbe {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl OutputProbe {
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.writes().concat()
    }
}

pub struct MemoryOutput {
    name: String,
    probe: OutputProbe,
    advance: Option<(Arc<Mock>, Duration)>,
}

impl MemoryOutput {
    pub fn new(name: &str) -> (Self, OutputProbe) {
        let probe = OutputProbe::default();
        let output = Self {
            name: name.to_string(),
            probe: probe.clone(),
            advance: None,
        };
        (output, probe)
    }

    /// Advances the given mocked clock by `step` on every write, as if each write took that long.
    pub fn advancing(mut self, mock: Arc<Mock>, step: Duration) -> Self {
        self.advance = Some((mock, step));
        self
    }
}

#[async_trait]
impl OutputEndpoint for MemoryOutput {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if let Some((mock, step)) = &self.advance {
            mock.increment(*step);
        }
        self.probe.writes.lock().unwrap().push(data.to_vec());
        Ok(())
    }
}

pub struct FailingOutput {
    name: String,
}

impl FailingOutput {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl OutputEndpoint for FailingOutput {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, _data: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::WriteZero, "output is full"))
    }
}

/// A host that records every notification it receives.
pub struct TestHost {
    endpoints: Endpoints,
    running_notifications: usize,
    finished: Vec<CompletionStatus>,
    reports: Vec<StatsReport>,
}

impl TestHost {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            running_notifications: 0,
            finished: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn running(&self) -> bool {
        self.running_notifications > 0
    }

    pub fn running_notifications(&self) -> usize {
        self.running_notifications
    }

    pub fn finished(&self) -> Vec<CompletionStatus> {
        self.finished.clone()
    }

    pub fn reports(&self) -> Vec<StatsReport> {
        self.reports.clone()
    }
}

impl Host for TestHost {
    fn notify_running(&mut self) {
        self.running_notifications += 1;
    }

    fn notify_finished(&mut self, status: CompletionStatus) {
        self.finished.push(status);
    }

    fn endpoints(&mut self) -> &mut Endpoints {
        &mut self.endpoints
    }

    fn emit_report(&mut self, report: &StatsReport) {
        self.reports.push(report.clone());
    }
}
