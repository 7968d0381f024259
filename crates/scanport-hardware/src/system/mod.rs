//! Connection provider for real devices.
//!
//! The report pipe is backed by `hidapi` (feature `hardware-usb`) and serial
//! ports by `serialport` (feature `hardware-serial`). A transport whose feature
//! is off still has a provider method; opening it reports the transport as
//! unavailable.

#[cfg(feature = "hardware-usb")]
mod hid;
#[cfg(feature = "hardware-serial")]
mod serial;

#[cfg(feature = "hardware-usb")]
pub use hid::HidReportPipe;
#[cfg(feature = "hardware-serial")]
pub use serial::SystemSerialLink;

use bytes::Bytes;
use std::time::Duration;

use crate::{
    Result,
    traits::{ConnectionProvider, ReportPipe, SerialLink},
    types::LineSettings,
};

/// Stand-in for a connection type that was compiled out. Cannot be built.
#[derive(Debug)]
pub enum Unavailable {}

impl ReportPipe for Unavailable {
    async fn write_output(&self, _report: &[u8]) -> Result<usize> {
        match *self {}
    }

    async fn read_input(&self) -> Result<Bytes> {
        match *self {}
    }
}

impl SerialLink for Unavailable {
    async fn write(&self, _bytes: &[u8], _timeout: Duration) -> Result<usize> {
        match *self {}
    }

    async fn read(&self, _capacity: usize, _timeout: Duration) -> Result<Bytes> {
        match *self {}
    }

    async fn close(&self) -> Result<()> {
        match *self {}
    }
}

#[cfg(feature = "hardware-usb")]
type PipeImpl = HidReportPipe;
#[cfg(not(feature = "hardware-usb"))]
type PipeImpl = Unavailable;

#[cfg(feature = "hardware-serial")]
type LinkImpl = SystemSerialLink;
#[cfg(not(feature = "hardware-serial"))]
type LinkImpl = Unavailable;

/// Device name for serial port `port_number`.
///
/// Port numbers are 1-based as configured: port 1 is `COM1` on Windows and
/// `/dev/ttyS0` elsewhere.
pub fn serial_port_name(port_number: u8) -> String {
    if cfg!(windows) {
        format!("COM{port_number}")
    } else {
        format!("/dev/ttyS{}", port_number.saturating_sub(1))
    }
}

/// Opens the platform's scanner connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider;

impl ConnectionProvider for SystemProvider {
    type Pipe = PipeImpl;
    type Link = LinkImpl;

    async fn open_report_pipe(&self) -> Result<PipeImpl> {
        #[cfg(feature = "hardware-usb")]
        {
            HidReportPipe::open().await
        }
        #[cfg(not(feature = "hardware-usb"))]
        {
            Err(crate::ScannerError::unsupported(scanport_core::Transport::Report))
        }
    }

    async fn open_serial(&self, port_number: u8, settings: LineSettings) -> Result<LinkImpl> {
        #[cfg(feature = "hardware-serial")]
        {
            SystemSerialLink::open(&serial_port_name(port_number), settings).await
        }
        #[cfg(not(feature = "hardware-serial"))]
        {
            let _ = (port_number, settings);
            Err(crate::ScannerError::unsupported(scanport_core::Transport::Serial))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_port_name() {
        if cfg!(windows) {
            assert_eq!(serial_port_name(1), "COM1");
            assert_eq!(serial_port_name(12), "COM12");
        } else {
            assert_eq!(serial_port_name(1), "/dev/ttyS0");
            assert_eq!(serial_port_name(12), "/dev/ttyS11");
        }
    }

    #[cfg(not(feature = "hardware-usb"))]
    #[tokio::test]
    async fn test_report_pipe_unavailable_without_feature() {
        let err = SystemProvider.open_report_pipe().await.unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::TransportUnavailable);
    }

    #[cfg(not(feature = "hardware-serial"))]
    #[tokio::test]
    async fn test_serial_unavailable_without_feature() {
        let err = SystemProvider
            .open_serial(1, LineSettings::SCANNER)
            .await
            .unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::TransportUnavailable);
    }
}
