//! Report transport backend.
//!
//! Commands go out as 11-byte output reports. Inbound data arrives as 64-byte
//! input reports pushed by the platform; while the backend is enabled a pump
//! task waits on [`ReportPipe::read_input`] and hands every report to
//! [`ReportBackend::on_report_received`], one at a time. There is no timer.

use scanport_core::{
    BarcodeEvent, CommandName, ConnectionState, ScannerConfiguration, Transport,
    constants::REPORT_COMMAND_SIZE,
};
use scanport_protocol::{decode_report_packet, report_command};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    Result, ScannerError,
    stats::Statistics,
    task::BackgroundTask,
    traits::{ConnectionProvider, EventSink, ReportPipe, ScannerBackend},
    types::ScannerStats,
};

const TARGET: &str = "report pipe";

/// State shared between the backend and its pump task.
struct ReportShared<P> {
    state: Mutex<ConnectionState>,
    pipe: Mutex<Option<Arc<P>>>,
    stats: Statistics,
    sink: Arc<dyn EventSink>,
}

impl<P: ReportPipe> ReportShared<P> {
    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state();
        if *state != next {
            debug!("Report backend {} -> {}", *state, next);
            *state = next;
        }
    }

    fn pipe(&self) -> Result<Arc<P>> {
        self.pipe
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(ScannerError::NotInitialized)
    }

    fn replace_pipe(&self, pipe: Option<Arc<P>>) -> Option<Arc<P>> {
        let mut slot = self.pipe.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *slot, pipe)
    }

    fn on_report_received(&self, buffer: &[u8]) {
        let packet = match decode_report_packet(buffer) {
            Ok(packet) => packet,
            Err(reason) => {
                self.stats.record_error();
                warn!("Rejected input report: {}", reason);
                return;
            }
        };

        self.stats.record_frame();

        if packet.length_overflow() {
            debug!(
                "Report length byte {} exceeds packet, treating as status-only",
                packet.declared_length()
            );
        }

        let symbology = packet.symbology();
        let payload = packet.into_payload();
        if payload.is_empty() {
            trace!("Status-only report ({})", symbology);
            return;
        }

        trace!("Report carries {} bytes of {}", payload.len(), symbology);
        self.sink
            .notify(BarcodeEvent::new(payload, symbology, Transport::Report));
    }
}

/// Pause after a failed input report read.
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Consecutive failed reads after which the pipe is given up on.
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Waits for input reports until cancelled or the pipe goes away.
///
/// A failed read is retried after [`READ_RETRY_DELAY`]. A disconnect, or
/// [`MAX_CONSECUTIVE_FAILURES`] failures in a row, ends the pump and leaves
/// the backend `Faulted`.
async fn pump_reports<P: ReportPipe>(
    shared: Arc<ReportShared<P>>,
    pipe: Arc<P>,
    cancel: CancellationToken,
) {
    let mut failures = 0u32;

    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            outcome = pipe.read_input() => outcome,
        };

        match outcome {
            Ok(report) => {
                failures = 0;
                shared.on_report_received(&report);
            }
            Err(e) if e.is_timeout() => {
                failures = 0;
                tokio::task::yield_now().await;
            }
            Err(e @ ScannerError::Communication { .. }) => {
                shared.stats.record_error();
                failures += 1;
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    error!("Report pipe failed {} reads in a row, stopping pump: {}", failures, e);
                    break;
                }
                warn!("Input report read failed ({}/{}): {}", failures, MAX_CONSECUTIVE_FAILURES, e);

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(READ_RETRY_DELAY) => {}
                }
            }
            Err(e) => {
                shared.stats.record_error();
                error!("Report pipe lost, stopping pump: {}", e);
                break;
            }
        }
    }

    shared.set_state(ConnectionState::Faulted);
}

/// Backend for scanners on the USB report transport.
pub struct ReportBackend<C: ConnectionProvider> {
    provider: Arc<C>,
    shared: Arc<ReportShared<C::Pipe>>,
    pump: Option<BackgroundTask>,
}

impl<C: ConnectionProvider> ReportBackend<C> {
    pub fn new(provider: Arc<C>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            provider,
            shared: Arc::new(ReportShared {
                state: Mutex::new(ConnectionState::Uninitialized),
                pipe: Mutex::new(None),
                stats: Statistics::new(),
                sink,
            }),
            pump: None,
        }
    }

    /// Bind the report pipe.
    ///
    /// # Errors
    ///
    /// Returns a connection error, and leaves the backend `Faulted`, if the
    /// platform cannot supply the pipe.
    pub async fn initialize(&mut self, _config: &ScannerConfiguration) -> Result<()> {
        if self.state() != ConnectionState::Uninitialized {
            self.shutdown().await;
        }
        self.shared.stats.reset();

        match self.provider.open_report_pipe().await {
            Ok(pipe) => {
                self.shared.replace_pipe(Some(Arc::new(pipe)));
                self.shared.set_state(ConnectionState::Configured);
                info!("Report pipe bound");
                Ok(())
            }
            Err(e) => {
                self.shared.set_state(ConnectionState::Faulted);
                let e = e.into_connection(TARGET);
                error!("Failed to bind report pipe: {}", e);
                Err(e)
            }
        }
    }

    /// Send the enable report and start the pump.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error unless `Configured` or `Disabled`, or
    /// the write error if the enable report could not be sent. The state is
    /// unchanged in both cases.
    ///
    /// A pump that gave up on the pipe leaves the backend `Faulted`, so
    /// `start` fails until the backend is initialized again.
    pub async fn start(&mut self) -> Result<()> {
        let state = self.state();
        if state == ConnectionState::Enabled {
            debug!("Report backend already enabled");
            return Ok(());
        }
        if !state.can_start() {
            return Err(ScannerError::invalid_state("start", state));
        }

        let pipe = self.shared.pipe()?;
        if let Err(e) = pipe.write_output(&report_command(CommandName::Enable)).await {
            warn!("Enable report failed: {}", e);
            return Err(e);
        }

        self.shared.set_state(ConnectionState::Enabled);

        let shared = Arc::clone(&self.shared);
        self.pump = Some(BackgroundTask::spawn("report pump", move |cancel| {
            pump_reports(shared, pipe, cancel)
        }));

        info!("Report scanner enabled");
        Ok(())
    }

    /// Stop the pump, then attempt the disable report. Always ends `Disabled`
    /// when a pipe is bound.
    pub async fn stop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.stop().await;
        }

        let state = self.state();
        if !matches!(state, ConnectionState::Enabled | ConnectionState::Configured) {
            debug!("Report backend stop ignored while {}", state);
            return;
        }

        match self.shared.pipe() {
            Ok(pipe) => {
                if let Err(e) = pipe.write_output(&report_command(CommandName::Disable)).await {
                    warn!("Disable report failed, disabling anyway: {}", e);
                }
            }
            Err(e) => warn!("No pipe for disable report: {}", e),
        }

        self.shared.set_state(ConnectionState::Disabled);
        info!("Report scanner disabled");
    }

    /// Write a caller-built command report verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::CommandTooLong`] for commands over 11 bytes,
    /// otherwise whatever the pipe returned.
    pub async fn send_raw(&self, command: &[u8]) -> Result<usize> {
        if command.len() > REPORT_COMMAND_SIZE {
            return Err(ScannerError::CommandTooLong {
                len: command.len(),
                limit: REPORT_COMMAND_SIZE,
            });
        }

        let pipe = self.shared.pipe()?;
        let written = pipe.write_output(command).await?;
        trace!("Wrote {}-byte command report", written);
        Ok(written)
    }

    pub async fn send_command(&self, name: CommandName) -> Result<()> {
        debug!("Sending {} report", name);
        self.send_raw(&report_command(name)).await.map(|_| ())
    }

    /// Decode one input report and forward its barcode, if any.
    ///
    /// Called by the pump; public for platforms that deliver reports themselves.
    pub fn on_report_received(&self, buffer: &[u8]) {
        self.shared.on_report_received(buffer);
    }

    pub async fn shutdown(&mut self) {
        self.stop().await;
        if self.shared.replace_pipe(None).is_some() {
            debug!("Report pipe released");
        }
        self.shared.set_state(ConnectionState::Uninitialized);
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state()
    }

    pub fn stats(&self) -> ScannerStats {
        self.shared.stats.snapshot()
    }

    /// The pump task is running.
    pub fn is_pumping(&self) -> bool {
        self.pump.as_ref().is_some_and(|pump| !pump.is_finished())
    }
}

impl<C: ConnectionProvider> ScannerBackend for ReportBackend<C> {
    async fn initialize(&mut self, config: &ScannerConfiguration) -> Result<()> {
        ReportBackend::initialize(self, config).await
    }

    async fn start(&mut self) -> Result<()> {
        ReportBackend::start(self).await
    }

    async fn stop(&mut self) {
        ReportBackend::stop(self).await
    }

    async fn send_command(&self, name: CommandName) -> Result<()> {
        ReportBackend::send_command(self, name).await
    }

    async fn shutdown(&mut self) {
        ReportBackend::shutdown(self).await
    }

    fn state(&self) -> ConnectionState {
        ReportBackend::state(self)
    }

    fn stats(&self) -> ScannerStats {
        ReportBackend::stats(self)
    }

    fn transport(&self) -> Transport {
        Transport::Report
    }
}
