//! Scanner lifecycle manager.
//!
//! [`ScannerManager`] is the single entry point for applications. It validates
//! a [`ScannerConfiguration`], builds the backend for the selected transport
//! and forwards lifecycle calls to it. Re-initializing replaces the backend,
//! so a transport switch is just another `initialize`.
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use scanport_core::{ConnectionState, ScannerConfiguration};
//! use scanport_hardware::ScannerManager;
//! use scanport_hardware::mock::{MockProvider, MockSerialLink, ReadOutcome};
//! use scanport_hardware::sink::ChannelSink;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> scanport_hardware::Result<()> {
//! let (link, handle) = MockSerialLink::new();
//! let (sink, mut events) = ChannelSink::new(16);
//! let mut manager = ScannerManager::new(MockProvider::new().with_serial_link(link), sink);
//!
//! manager.initialize(ScannerConfiguration::serial(1)).await?;
//! manager.start().await?;
//! assert_eq!(manager.state(), ConnectionState::Enabled);
//!
//! handle.push_read(ReadOutcome::Data(Bytes::from_static(b"4006381333931\r\n")));
//! let event = events.recv().await.unwrap();
//! assert_eq!(event.payload_str(), Some("4006381333931"));
//!
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

use scanport_core::{CommandName, ConnectionState, ScannerConfiguration, Transport};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    Result, ScannerError,
    devices::AnyBackend,
    traits::{ConnectionProvider, EventSink, ScannerBackend},
    types::{ScannerOptions, ScannerStats},
};

/// Owns at most one transport backend at a time.
pub struct ScannerManager<C: ConnectionProvider> {
    provider: Arc<C>,
    sink: Arc<dyn EventSink>,
    options: ScannerOptions,
    backend: Option<AnyBackend<C>>,
    config: Option<ScannerConfiguration>,
}

impl<C: ConnectionProvider> ScannerManager<C> {
    pub fn new(provider: C, sink: impl EventSink) -> Self {
        Self::with_options(provider, sink, ScannerOptions::default())
    }

    pub fn with_options(provider: C, sink: impl EventSink, options: ScannerOptions) -> Self {
        Self {
            provider: Arc::new(provider),
            sink: Arc::new(sink),
            options,
            backend: None,
            config: None,
        }
    }

    /// Apply `config`, replacing any backend bound by an earlier call.
    ///
    /// A disabled configuration is accepted and leaves no backend bound. If
    /// the transport handle cannot be opened the backend is still kept, in the
    /// `Faulted` state, and the open error is returned.
    ///
    /// # Errors
    ///
    /// - [`ScannerError::Configuration`] for an invalid configuration; nothing
    ///   is changed in that case
    /// - [`ScannerError::UnsupportedTransport`] if the transport was compiled out
    /// - the backend's error if its transport handle could not be opened
    pub async fn initialize(&mut self, config: ScannerConfiguration) -> Result<()> {
        config.validate()?;

        if let Some(mut previous) = self.backend.take() {
            debug!("Releasing {} backend before re-initializing", previous.transport());
            previous.shutdown().await;
        }

        let transport = config.transport;
        self.config = Some(config.clone());

        if !config.enabled {
            info!("Scanner disabled by configuration");
            return Ok(());
        }

        let mut backend = AnyBackend::for_transport(
            transport,
            Arc::clone(&self.provider),
            Arc::clone(&self.sink),
            self.options,
        )?;
        let result = backend.initialize(&config).await;
        self.backend = Some(backend);

        match &result {
            Ok(()) => info!("Scanner initialized on {} transport", transport),
            Err(e) => warn!("Scanner initialization on {} failed: {}", transport, e),
        }
        result
    }

    /// # Errors
    ///
    /// Returns [`ScannerError::NotInitialized`] if no backend is bound,
    /// otherwise the backend's start error.
    pub async fn start(&mut self) -> Result<()> {
        self.backend_mut()?.start().await
    }

    pub async fn stop(&mut self) {
        match self.backend.as_mut() {
            Some(backend) => backend.stop().await,
            None => debug!("Stop requested with no scanner bound"),
        }
    }

    /// Send one of the scanner's named commands.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::NotInitialized`] if no backend is bound,
    /// otherwise the backend's write error.
    pub async fn send_command(&self, name: CommandName) -> Result<()> {
        self.backend
            .as_ref()
            .ok_or(ScannerError::NotInitialized)?
            .send_command(name)
            .await
    }

    /// Stop and release the backend. Calling it again does nothing.
    pub async fn shutdown(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.shutdown().await;
            info!("Scanner shut down");
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.backend
            .as_ref()
            .map_or(ConnectionState::Uninitialized, |backend| backend.state())
    }

    pub fn stats(&self) -> ScannerStats {
        self.backend
            .as_ref()
            .map(|backend| backend.stats())
            .unwrap_or_default()
    }

    /// Transport of the bound backend, if any.
    pub fn transport(&self) -> Option<Transport> {
        self.backend.as_ref().map(|backend| backend.transport())
    }

    /// Configuration accepted by the last successful validation.
    pub fn configuration(&self) -> Option<&ScannerConfiguration> {
        self.config.as_ref()
    }

    pub fn backend(&self) -> Option<&AnyBackend<C>> {
        self.backend.as_ref()
    }

    pub fn provider(&self) -> &C {
        &self.provider
    }

    fn backend_mut(&mut self) -> Result<&mut AnyBackend<C>> {
        self.backend.as_mut().ok_or(ScannerError::NotInitialized)
    }
}
