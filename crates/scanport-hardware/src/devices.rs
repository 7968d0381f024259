//! Enum dispatch over the transport backends.
//!
//! [`ScannerBackend`] uses native `async fn` and so cannot be boxed as a trait
//! object. The manager holds an [`AnyBackend`] instead and every call is a
//! `match` over the variants. The serial variant exists only with the
//! `serial-transport` feature.
//!
//! ```
//! use scanport_hardware::devices::AnyBackend;
//! use scanport_hardware::mock::MockProvider;
//! use scanport_hardware::sink::NullSink;
//! use scanport_hardware::{ScannerBackend, ScannerOptions};
//! use scanport_core::{ConnectionState, Transport};
//! use std::sync::Arc;
//!
//! let backend = AnyBackend::for_transport(
//!     Transport::Report,
//!     Arc::new(MockProvider::new()),
//!     Arc::new(NullSink),
//!     ScannerOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(backend.transport(), Transport::Report);
//! assert_eq!(backend.state(), ConnectionState::Uninitialized);
//! ```

use scanport_core::{CommandName, ConnectionState, ScannerConfiguration, Transport};
use std::sync::Arc;

use crate::report::ReportBackend;
#[cfg(feature = "serial-transport")]
use crate::serial::SerialBackend;
use crate::traits::{ConnectionProvider, EventSink, ScannerBackend};
use crate::types::{ScannerOptions, ScannerStats};
use crate::Result;
#[cfg(not(feature = "serial-transport"))]
use crate::ScannerError;

/// One of the transport backends.
#[non_exhaustive]
pub enum AnyBackend<C: ConnectionProvider> {
    Report(ReportBackend<C>),
    #[cfg(feature = "serial-transport")]
    Serial(SerialBackend<C>),
}

impl<C: ConnectionProvider> AnyBackend<C> {
    /// Build the backend for `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::UnsupportedTransport`] if the transport was
    /// compiled out.
    pub fn for_transport(
        transport: Transport,
        provider: Arc<C>,
        sink: Arc<dyn EventSink>,
        options: ScannerOptions,
    ) -> Result<Self> {
        match transport {
            Transport::Report => Ok(Self::Report(ReportBackend::new(provider, sink))),
            #[cfg(feature = "serial-transport")]
            Transport::Serial => Ok(Self::Serial(SerialBackend::new(provider, sink, options))),
            #[cfg(not(feature = "serial-transport"))]
            Transport::Serial => {
                let _ = options;
                Err(ScannerError::unsupported(transport))
            }
        }
    }

    pub fn as_report(&self) -> Option<&ReportBackend<C>> {
        match self {
            Self::Report(backend) => Some(backend),
            #[cfg(feature = "serial-transport")]
            _ => None,
        }
    }

    #[cfg(feature = "serial-transport")]
    pub fn as_serial(&self) -> Option<&SerialBackend<C>> {
        match self {
            Self::Serial(backend) => Some(backend),
            _ => None,
        }
    }
}

impl<C: ConnectionProvider> ScannerBackend for AnyBackend<C> {
    async fn initialize(&mut self, config: &ScannerConfiguration) -> Result<()> {
        match self {
            Self::Report(backend) => backend.initialize(config).await,
            #[cfg(feature = "serial-transport")]
            Self::Serial(backend) => backend.initialize(config).await,
        }
    }

    async fn start(&mut self) -> Result<()> {
        match self {
            Self::Report(backend) => backend.start().await,
            #[cfg(feature = "serial-transport")]
            Self::Serial(backend) => backend.start().await,
        }
    }

    async fn stop(&mut self) {
        match self {
            Self::Report(backend) => backend.stop().await,
            #[cfg(feature = "serial-transport")]
            Self::Serial(backend) => backend.stop().await,
        }
    }

    async fn send_command(&self, name: CommandName) -> Result<()> {
        match self {
            Self::Report(backend) => backend.send_command(name).await,
            #[cfg(feature = "serial-transport")]
            Self::Serial(backend) => backend.send_command(name).await,
        }
    }

    async fn shutdown(&mut self) {
        match self {
            Self::Report(backend) => backend.shutdown().await,
            #[cfg(feature = "serial-transport")]
            Self::Serial(backend) => backend.shutdown().await,
        }
    }

    fn state(&self) -> ConnectionState {
        match self {
            Self::Report(backend) => backend.state(),
            #[cfg(feature = "serial-transport")]
            Self::Serial(backend) => backend.state(),
        }
    }

    fn stats(&self) -> ScannerStats {
        match self {
            Self::Report(backend) => backend.stats(),
            #[cfg(feature = "serial-transport")]
            Self::Serial(backend) => backend.stats(),
        }
    }

    fn transport(&self) -> Transport {
        match self {
            Self::Report(_) => Transport::Report,
            #[cfg(feature = "serial-transport")]
            Self::Serial(_) => Transport::Serial,
        }
    }
}
