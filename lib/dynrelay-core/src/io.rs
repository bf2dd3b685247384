//! Endpoint adapters over asynchronous readers and writers.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _};

use crate::host::{InputEndpoint, OutputEndpoint};

/// An input endpoint backed by an asynchronous reader.
pub struct ReaderInput<R> {
    name: String,
    reader: R,
}

impl<R> ReaderInput<R> {
    /// Creates a new `ReaderInput` with the given name.
    pub fn new<S: Into<String>>(name: S, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

#[async_trait]
impl<R> InputEndpoint for ReaderInput<R>
where
    R: AsyncRead + Send + Unpin,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf).await
    }
}

/// An output endpoint backed by an asynchronous writer.
pub struct WriterOutput<W> {
    name: String,
    writer: W,
}

impl<W> WriterOutput<W> {
    /// Creates a new `WriterOutput` with the given name.
    pub fn new<S: Into<String>>(name: S, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    /// Consumes the endpoint, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> OutputEndpoint for WriterOutput<W>
where
    W: AsyncWrite + Send + Unpin,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }
}
