//! Capability traits between the engine and the platform.
//!
//! The engine never touches a device directly. Everything it needs from the
//! platform is expressed here:
//!
//! - [`ReportPipe`]: the USB interrupt pipe (output reports out, input reports in)
//! - [`SerialLink`]: an open serial connection
//! - [`ConnectionProvider`]: opens the two kinds of connection by name
//! - [`EventSink`]: where normalized barcode reads go
//!
//! [`ScannerBackend`] is the contract both transport backends fulfil; the
//! lifecycle manager drives it through [`AnyBackend`](crate::devices::AnyBackend).
//!
//! Platform methods return `impl Future + Send` so that backends can move them
//! into spawned tasks. Implementations are free to write them as `async fn`.

#![allow(async_fn_in_trait)]

use bytes::Bytes;
use scanport_core::{BarcodeEvent, CommandName, ConnectionState, ScannerConfiguration, Transport};
use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::types::{LineSettings, ScannerStats};

/// The report transport's interrupt pipe.
pub trait ReportPipe: Send + Sync + 'static {
    /// Write one output (command) report. Returns the number of bytes written.
    fn write_output(&self, report: &[u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Wait for the next input report pushed by the device.
    ///
    /// May fail with [`ScannerError::Timeout`](crate::ScannerError::Timeout)
    /// if the platform bounds the wait; the report pump just waits again.
    fn read_input(&self) -> impl Future<Output = Result<Bytes>> + Send;
}

/// An open serial connection.
pub trait SerialLink: Send + Sync + 'static {
    /// Write `bytes`, giving up after `timeout`.
    fn write(&self, bytes: &[u8], timeout: Duration) -> impl Future<Output = Result<usize>> + Send;

    /// Read at most `capacity` bytes.
    ///
    /// A read with nothing to report fails with
    /// [`ScannerError::Timeout`](crate::ScannerError::Timeout) after `timeout`.
    fn read(&self, capacity: usize, timeout: Duration) -> impl Future<Output = Result<Bytes>> + Send;

    /// Release the connection.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens connections on behalf of the backends.
pub trait ConnectionProvider: Send + Sync + 'static {
    type Pipe: ReportPipe;
    type Link: SerialLink;

    /// Bind the scanner's report pipe.
    fn open_report_pipe(&self) -> impl Future<Output = Result<Self::Pipe>> + Send;

    /// Open serial port `port_number` with the given line settings.
    fn open_serial(
        &self,
        port_number: u8,
        settings: LineSettings,
    ) -> impl Future<Output = Result<Self::Link>> + Send;
}

/// Receiver of normalized barcode reads.
///
/// `notify` is fire-and-forget and runs on the backend's task; it must not
/// block and must not call back into the scanner.
pub trait EventSink: Send + Sync + 'static {
    fn notify(&self, event: BarcodeEvent);
}

impl<F> EventSink for F
where
    F: Fn(BarcodeEvent) + Send + Sync + 'static,
{
    fn notify(&self, event: BarcodeEvent) {
        self(event)
    }
}

/// Lifecycle contract shared by the report and serial backends.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait uses `async fn` and is therefore not object-safe. The manager
/// holds an [`AnyBackend`](crate::devices::AnyBackend) and dispatches through
/// a `match` instead of a `Box<dyn ScannerBackend>`.
pub trait ScannerBackend {
    /// Bind the transport handle. Resets statistics.
    async fn initialize(&mut self, config: &ScannerConfiguration) -> Result<()>;

    /// Send the enable command and begin acquiring data.
    async fn start(&mut self) -> Result<()>;

    /// Stop acquiring data, then attempt the disable command. Never fails.
    async fn stop(&mut self);

    /// Encode and send a command on this transport.
    async fn send_command(&self, name: CommandName) -> Result<()>;

    /// Stop, then release the transport handle.
    async fn shutdown(&mut self);

    fn state(&self) -> ConnectionState;

    fn stats(&self) -> ScannerStats;

    fn transport(&self) -> Transport;
}
