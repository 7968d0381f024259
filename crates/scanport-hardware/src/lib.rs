//! Transport backends and lifecycle management for barcode scanners.
//!
//! Two transports are supported:
//!
//! - **Report**: a USB interrupt pipe. Commands go out as 11-byte output
//!   reports; the device pushes 64-byte input reports, which are decoded as
//!   they arrive.
//! - **Serial**: a 9600-8-N-1 line. Commands go out as ASCII text; while the
//!   scanner is enabled a poll cycle reads up to 256 bytes at a time, with at
//!   most one read in flight.
//!
//! Both normalize reads into [`BarcodeEvent`](scanport_core::BarcodeEvent)s
//! and hand them to an [`EventSink`].
//!
//! # Architecture
//!
//! The engine never opens a device itself. A [`ConnectionProvider`] supplies
//! the [`ReportPipe`] and [`SerialLink`] connections: [`SystemProvider`] for
//! real hardware and [`MockProvider`](mock::MockProvider) for tests. The
//! [`ScannerManager`] owns one backend at a time and forwards lifecycle calls
//! to it:
//!
//! ```text
//! ScannerManager ──> AnyBackend ──┬── ReportBackend ── pump task ──> EventSink
//!                                 └── SerialBackend ── poll cycle ─> EventSink
//! ```
//!
//! # Features
//!
//! - `serial-transport` (default): the serial backend and poll cycle
//! - `hardware-usb`: report pipe over `hidapi`
//! - `hardware-serial`: serial ports over `serialport`
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`] with a [`ScannerError`]. Use
//! [`ScannerError::category`] to tell configuration mistakes from missing
//! transports, connection failures, I/O faults and parse rejections.

pub mod devices;
pub mod error;
pub mod manager;
pub mod mock;
#[cfg(feature = "serial-transport")]
mod poll;
pub mod report;
#[cfg(feature = "serial-transport")]
pub mod serial;
pub mod sink;
pub mod stats;
pub mod system;
mod task;
pub mod traits;
pub mod types;

pub use error::{ErrorCategory, Result, ScannerError};
pub use traits::{ConnectionProvider, EventSink, ReportPipe, ScannerBackend, SerialLink};
pub use types::{FrameAssembly, LineSettings, Parity, ScannerOptions, ScannerStats, SerialTiming};

pub use devices::AnyBackend;
pub use manager::ScannerManager;
pub use report::ReportBackend;
#[cfg(feature = "serial-transport")]
pub use serial::SerialBackend;
pub use sink::{ChannelSink, NullSink};
pub use system::{SystemProvider, serial_port_name};
