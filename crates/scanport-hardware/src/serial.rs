//! Serial transport backend.
//!
//! The serial link has no data path of its own, so while enabled the backend
//! runs a poll cycle (see [`poll`](crate::poll)) that keeps at most one read
//! in flight. Completed reads come back here to be framed, classified and
//! forwarded.
//!
//! # Lifecycle
//!
//! ```text
//! initialize ──> Configured ──start──> Enabled ──stop──> Disabled
//!      │                                  ^                  │
//!      └──(open failed)──> Faulted        └──────start───────┘
//! ```
//!
//! `stop` cancels the poll cycle first and waits for it, which also aborts any
//! read still in flight. Only then is `DISABLE` attempted. The backend ends up
//! `Disabled` whether or not that write succeeds.

use bytes::Bytes;
use scanport_core::{
    BarcodeEvent, CommandName, ConnectionState, ScannerConfiguration, Transport,
    constants::SERIAL_CAPTURE_CAPACITY,
};
use scanport_protocol::{
    FrameAccumulator, SerialFrame, SerialReply, classify_symbology, decode_serial_frame,
    serial_command,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::{
    Result, ScannerError,
    poll::run_poll_cycle,
    stats::Statistics,
    task::BackgroundTask,
    traits::{ConnectionProvider, EventSink, ScannerBackend, SerialLink},
    types::{FrameAssembly, LineSettings, ScannerOptions, ScannerStats, SerialTiming},
};

/// State shared between the backend, its poll cycle and the read tasks.
pub(crate) struct SerialShared<L> {
    state: Mutex<ConnectionState>,
    link: Mutex<Option<Arc<L>>>,
    pub(crate) stats: Statistics,
    sink: Arc<dyn EventSink>,
    read_outstanding: AtomicBool,
    accumulator: Mutex<FrameAccumulator>,
    assembly: FrameAssembly,
    pub(crate) timing: SerialTiming,
}

impl<L: SerialLink> SerialShared<L> {
    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state();
        if *state != next {
            debug!("Serial backend {} -> {}", *state, next);
            *state = next;
        }
    }

    fn link(&self) -> Result<Arc<L>> {
        self.link
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(ScannerError::NotInitialized)
    }

    fn replace_link(&self, link: Option<Arc<L>>) -> Option<Arc<L>> {
        let mut slot = self.link.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *slot, link)
    }

    fn accumulator(&self) -> MutexGuard<'_, FrameAccumulator> {
        self.accumulator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the single read slot. Returns `false` if a read is outstanding.
    pub(crate) fn try_claim_read(&self) -> bool {
        self.read_outstanding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release_read(&self) {
        self.read_outstanding.store(false, Ordering::Release);
    }

    pub(crate) fn read_outstanding(&self) -> bool {
        self.read_outstanding.load(Ordering::Acquire)
    }

    /// Apply the outcome of one poll-issued read and free the read slot.
    pub(crate) fn on_read_complete(&self, outcome: Result<Bytes>) {
        match outcome {
            Ok(window) if window.is_empty() => trace!("Serial read returned no data"),
            Ok(window) => self.process_window(&window),
            Err(e) if e.is_timeout() => trace!("Serial read timed out"),
            Err(e) => {
                self.stats.record_error();
                warn!("Serial read failed: {}", e);
            }
        }
        self.release_read();
    }

    fn process_window(&self, window: &[u8]) {
        match self.assembly {
            FrameAssembly::SingleShot => match decode_serial_frame(window) {
                Some(frame) => self.handle_frame(frame),
                None => {
                    self.stats.record_error();
                    debug!("No terminated frame in {}-byte serial read", window.len());
                }
            },
            FrameAssembly::Reassemble => {
                let (frames, overflows, partial) = {
                    let mut acc = self.accumulator();
                    acc.feed(window);
                    let frames: Vec<SerialFrame> = acc.drain_frames().collect();
                    (frames, acc.take_overflows(), acc.has_partial())
                };

                if overflows > 0 {
                    self.stats.record_errors(u64::try_from(overflows).unwrap_or(u64::MAX));
                    warn!("Dropped {} oversized serial run(s)", overflows);
                }
                if frames.is_empty() && overflows == 0 && !partial {
                    self.stats.record_error();
                    debug!("Serial read of {} bytes held only noise", window.len());
                }
                for frame in frames {
                    self.handle_frame(frame);
                }
            }
        }
    }

    fn handle_frame(&self, frame: SerialFrame) {
        self.stats.record_frame();

        match SerialReply::classify(&frame) {
            SerialReply::Ack => debug!("Scanner acknowledged command"),
            SerialReply::Nak => warn!("Scanner rejected command"),
            SerialReply::Data(payload) | SerialReply::Barcode(payload) => {
                if payload.is_empty() {
                    debug!("Empty data reply");
                    return;
                }
                let symbology = classify_symbology(payload.len());
                trace!("Serial frame of {} bytes, {}", payload.len(), symbology);
                self.sink
                    .notify(BarcodeEvent::new(payload, symbology, Transport::Serial));
            }
        }
    }
}

/// Write `bytes` to the link, bounded by `timeout` even if the link ignores it.
async fn write_bounded<L: SerialLink>(link: &L, bytes: &[u8], timeout: Duration) -> Result<usize> {
    match tokio::time::timeout(timeout, link.write(bytes, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(ScannerError::timeout_after(timeout)),
    }
}

/// Backend for scanners on a serial port.
pub struct SerialBackend<C: ConnectionProvider> {
    provider: Arc<C>,
    shared: Arc<SerialShared<C::Link>>,
    poll: Option<BackgroundTask>,
    port_number: Option<u8>,
}

impl<C: ConnectionProvider> SerialBackend<C> {
    pub fn new(provider: Arc<C>, sink: Arc<dyn EventSink>, options: ScannerOptions) -> Self {
        Self {
            provider,
            shared: Arc::new(SerialShared {
                state: Mutex::new(ConnectionState::Uninitialized),
                link: Mutex::new(None),
                stats: Statistics::new(),
                sink,
                read_outstanding: AtomicBool::new(false),
                accumulator: Mutex::new(FrameAccumulator::new()),
                assembly: options.frame_assembly,
                timing: options.timing,
            }),
            poll: None,
            port_number: None,
        }
    }

    /// Open the configured serial port at 9600-8-N-1.
    ///
    /// # Errors
    ///
    /// Returns a connection error, and leaves the backend `Faulted`, if the
    /// port cannot be opened or configured.
    pub async fn initialize(&mut self, config: &ScannerConfiguration) -> Result<()> {
        if self.state() != ConnectionState::Uninitialized {
            self.shutdown().await;
        }
        config.validate()?;

        self.shared.stats.reset();
        self.shared.accumulator().clear();
        self.port_number = Some(config.serial_port_number);

        let port = config.serial_port_number;
        match self.provider.open_serial(port, LineSettings::SCANNER).await {
            Ok(link) => {
                self.shared.replace_link(Some(Arc::new(link)));
                self.shared.set_state(ConnectionState::Configured);
                info!("Serial port {} opened at {}", port, LineSettings::SCANNER);
                Ok(())
            }
            Err(e) => {
                self.shared.set_state(ConnectionState::Faulted);
                let e = e.into_connection(&format!("serial port {port}"));
                error!("Failed to open serial port {}: {}", port, e);
                Err(e)
            }
        }
    }

    /// Send `ENABLE` and arm the poll cycle.
    ///
    /// No reply is awaited; a successful write is enough.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error unless `Configured` or `Disabled`, or
    /// the write error if `ENABLE` could not be sent. No poll is armed and the
    /// state is unchanged in both cases.
    pub async fn start(&mut self) -> Result<()> {
        let state = self.state();
        if state == ConnectionState::Enabled {
            debug!("Serial backend already enabled");
            return Ok(());
        }
        if !state.can_start() {
            return Err(ScannerError::invalid_state("start", state));
        }

        let link = self.shared.link()?;
        let timeout = self.shared.timing.command_timeout();
        if let Err(e) = write_bounded(&*link, serial_command(CommandName::Enable).as_bytes(), timeout).await {
            warn!("ENABLE failed: {}", e);
            return Err(e);
        }

        self.shared.set_state(ConnectionState::Enabled);

        let shared = Arc::clone(&self.shared);
        self.poll = Some(BackgroundTask::spawn("serial poll", move |cancel| {
            run_poll_cycle(shared, link, cancel)
        }));

        info!(
            "Serial scanner enabled, polling every {}ms",
            self.shared.timing.poll_period().as_millis()
        );
        Ok(())
    }

    /// Disarm the poll cycle, then attempt `DISABLE`.
    pub async fn stop(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.stop().await;
        }
        {
            let mut accumulator = self.shared.accumulator();
            if accumulator.has_partial() {
                debug!("Dropping unterminated serial data on stop");
            }
            accumulator.clear();
        }

        let state = self.state();
        if !matches!(state, ConnectionState::Enabled | ConnectionState::Configured) {
            debug!("Serial backend stop ignored while {}", state);
            return;
        }

        match self.shared.link() {
            Ok(link) => {
                let timeout = self.shared.timing.command_timeout();
                let disable = serial_command(CommandName::Disable).as_bytes();
                if let Err(e) = write_bounded(&*link, disable, timeout).await {
                    warn!("DISABLE failed, disabling anyway: {}", e);
                }
            }
            Err(e) => warn!("No link for DISABLE: {}", e),
        }

        self.shared.set_state(ConnectionState::Disabled);
        info!("Serial scanner disabled");
    }

    /// Write a caller-built request verbatim, independent of the poll cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::CommandTooLong`] for requests over 256 bytes,
    /// otherwise the link's result.
    pub async fn send_text(&self, text: &str) -> Result<usize> {
        if text.len() > SERIAL_CAPTURE_CAPACITY {
            return Err(ScannerError::CommandTooLong {
                len: text.len(),
                limit: SERIAL_CAPTURE_CAPACITY,
            });
        }

        let link = self.shared.link()?;
        let written = write_bounded(&*link, text.as_bytes(), self.shared.timing.command_timeout()).await?;
        trace!("Wrote {} bytes to serial port", written);
        Ok(written)
    }

    pub async fn send_command(&self, name: CommandName) -> Result<()> {
        debug!("Sending {} over serial", name);
        self.send_text(serial_command(name)).await.map(|_| ())
    }

    /// Stop, then close and release the link.
    pub async fn shutdown(&mut self) {
        self.stop().await;

        if let Some(link) = self.shared.replace_link(None) {
            if let Err(e) = link.close().await {
                warn!("Error closing serial port: {}", e);
            }
            debug!("Serial link released");
        }
        self.shared.release_read();
        self.shared.set_state(ConnectionState::Uninitialized);
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state()
    }

    pub fn stats(&self) -> ScannerStats {
        self.shared.stats.snapshot()
    }

    /// Port number of the last `initialize`.
    pub fn port_number(&self) -> Option<u8> {
        self.port_number
    }

    /// The poll cycle is running.
    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|poll| !poll.is_finished())
    }

    /// A poll-issued read has not completed yet.
    pub fn read_outstanding(&self) -> bool {
        self.shared.read_outstanding()
    }
}

impl<C: ConnectionProvider> ScannerBackend for SerialBackend<C> {
    async fn initialize(&mut self, config: &ScannerConfiguration) -> Result<()> {
        SerialBackend::initialize(self, config).await
    }

    async fn start(&mut self) -> Result<()> {
        SerialBackend::start(self).await
    }

    async fn stop(&mut self) {
        SerialBackend::stop(self).await
    }

    async fn send_command(&self, name: CommandName) -> Result<()> {
        SerialBackend::send_command(self, name).await
    }

    async fn shutdown(&mut self) {
        SerialBackend::shutdown(self).await
    }

    fn state(&self) -> ConnectionState {
        SerialBackend::state(self)
    }

    fn stats(&self) -> ScannerStats {
        SerialBackend::stats(self)
    }

    fn transport(&self) -> Transport {
        Transport::Serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockProvider, MockSerialLink};
    use crate::sink::ChannelSink;
    use scanport_core::SymbologyCode;

    fn backend(
        assembly: FrameAssembly,
    ) -> (
        SerialBackend<MockProvider>,
        crate::mock::MockSerialLinkHandle,
        tokio::sync::mpsc::Receiver<BarcodeEvent>,
    ) {
        let (link, handle) = MockSerialLink::new();
        let provider = Arc::new(MockProvider::new().with_serial_link(link));
        let (sink, events) = ChannelSink::new(8);
        let options = ScannerOptions {
            frame_assembly: assembly,
            ..ScannerOptions::default()
        };
        (
            SerialBackend::new(provider, Arc::new(sink), options),
            handle,
            events,
        )
    }

    #[tokio::test]
    async fn test_completion_forwards_classified_frame() {
        let (backend, _handle, mut events) = backend(FrameAssembly::SingleShot);

        backend
            .shared
            .on_read_complete(Ok(Bytes::from_static(b"OK1234567890\r\n")));

        let event = events.try_recv().unwrap();
        assert_eq!(event.payload_str(), Some("OK1234567890"));
        assert_eq!(event.symbology, SymbologyCode::EAN13);
        assert_eq!(backend.stats().frames_received, 1);
    }

    #[tokio::test]
    async fn test_ack_counted_not_forwarded() {
        let (backend, _handle, mut events) = backend(FrameAssembly::SingleShot);

        backend.shared.on_read_complete(Ok(Bytes::from_static(b"ACK\r\n")));
        assert_eq!(backend.stats().frames_received, 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_timeout_and_empty_read_are_not_errors() {
        let (backend, _handle, _events) = backend(FrameAssembly::SingleShot);

        assert!(backend.shared.try_claim_read());
        backend
            .shared
            .on_read_complete(Err(ScannerError::timeout(100)));
        assert!(!backend.read_outstanding());

        backend.shared.on_read_complete(Ok(Bytes::new()));
        assert_eq!(backend.stats(), ScannerStats::default());
    }

    #[tokio::test]
    async fn test_failed_read_and_noise_are_errors() {
        let (backend, _handle, mut events) = backend(FrameAssembly::SingleShot);

        backend
            .shared
            .on_read_complete(Err(ScannerError::communication("framing error")));
        backend
            .shared
            .on_read_complete(Ok(Bytes::from_static(b"\x01\x02partial")));

        assert_eq!(
            backend.stats(),
            ScannerStats {
                frames_received: 0,
                errors: 2
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_single_shot_loses_split_frame() {
        let (backend, _handle, mut events) = backend(FrameAssembly::SingleShot);

        backend.shared.on_read_complete(Ok(Bytes::from_static(b"400638")));
        backend.shared.on_read_complete(Ok(Bytes::from_static(b"1333931\r\n")));

        let event = events.try_recv().unwrap();
        assert_eq!(event.payload_str(), Some("1333931"));
        assert_eq!(backend.stats().errors, 1);
    }

    #[tokio::test]
    async fn test_reassembly_joins_split_frame() {
        let (backend, _handle, mut events) = backend(FrameAssembly::Reassemble);

        backend.shared.on_read_complete(Ok(Bytes::from_static(b"400638")));
        assert!(events.try_recv().is_err());
        backend.shared.on_read_complete(Ok(Bytes::from_static(b"1333931\r\n")));

        let event = events.try_recv().unwrap();
        assert_eq!(event.payload_str(), Some("4006381333931"));
        assert_eq!(event.symbology, SymbologyCode::EAN13);
        assert_eq!(backend.stats(), ScannerStats {
            frames_received: 1,
            errors: 0
        });
    }

    #[tokio::test]
    async fn test_data_reply_forwarded_without_prefix() {
        let (backend, _handle, mut events) = backend(FrameAssembly::SingleShot);

        backend
            .shared
            .on_read_complete(Ok(Bytes::from_static(b"DATA:ABC123\r")));
        let event = events.try_recv().unwrap();
        assert_eq!(event.payload_str(), Some("ABC123"));
    }

    #[tokio::test]
    async fn test_send_text_rejects_oversized_request() {
        let (mut backend, handle, _events) = backend(FrameAssembly::SingleShot);
        backend
            .initialize(&ScannerConfiguration::serial(1))
            .await
            .unwrap();

        let long = "X".repeat(SERIAL_CAPTURE_CAPACITY + 1);
        assert!(matches!(
            backend.send_text(&long).await,
            Err(ScannerError::CommandTooLong { .. })
        ));
        assert!(handle.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_discards_unterminated_data() {
        let (mut backend, _handle, mut events) = backend(FrameAssembly::Reassemble);
        backend
            .initialize(&ScannerConfiguration::serial(1))
            .await
            .unwrap();
        backend.start().await.unwrap();

        backend.shared.on_read_complete(Ok(Bytes::from_static(b"STALE")));
        backend.stop().await;
        backend.start().await.unwrap();
        backend.shared.on_read_complete(Ok(Bytes::from_static(b"1234\r\n")));

        let event = events.try_recv().unwrap();
        assert_eq!(event.payload_str(), Some("1234"));
        assert_eq!(backend.stats().errors, 0);
    }
}
