//! Serial link over the `serialport` crate.

use bytes::Bytes;
use serialport::{DataBits, FlowControl, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    Result, ScannerError,
    traits::SerialLink,
    types::{LineSettings, Parity},
};

type Port = Arc<Mutex<Box<dyn SerialPort>>>;

/// An open serial port.
///
/// Reader and writer are separate handles onto the same port, so a command
/// can go out while a poll read is blocked.
pub struct SystemSerialLink {
    name: String,
    reader: Port,
    writer: Port,
}

impl std::fmt::Debug for SystemSerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSerialLink")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn data_bits(bits: u8) -> Result<DataBits> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(ScannerError::communication(format!("unsupported data bits: {other}"))),
    }
}

fn stop_bits(bits: u8) -> Result<StopBits> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(ScannerError::communication(format!("unsupported stop bits: {other}"))),
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    }
}

fn io_error(e: std::io::Error, timeout: Duration) -> ScannerError {
    if e.kind() == ErrorKind::TimedOut {
        ScannerError::timeout_after(timeout)
    } else {
        ScannerError::Io(e)
    }
}

fn lock(port: &Port) -> std::sync::MutexGuard<'_, Box<dyn SerialPort>> {
    port.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SystemSerialLink {
    pub(crate) async fn open(name: &str, settings: LineSettings) -> Result<Self> {
        let name = name.to_string();
        let path = name.clone();

        let (reader, writer) = tokio::task::spawn_blocking(move || -> Result<_> {
            let target = || format!("serial port {path}");
            let port = serialport::new(&path, settings.baud_rate)
                .data_bits(data_bits(settings.data_bits)?)
                .parity(parity(settings.parity))
                .stop_bits(stop_bits(settings.stop_bits)?)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_millis(100))
                .open()
                .map_err(|e| ScannerError::connection(target(), e.to_string()))?;
            let writer = port
                .try_clone()
                .map_err(|e| ScannerError::connection(target(), e.to_string()))?;
            Ok((port, writer))
        })
        .await
        .map_err(|e| ScannerError::connection(format!("serial port {name}"), e.to_string()))??;

        info!("Opened {} at {}", name, settings);
        Ok(Self {
            name,
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

impl SerialLink for SystemSerialLink {
    async fn write(&self, bytes: &[u8], timeout: Duration) -> Result<usize> {
        let writer = Arc::clone(&self.writer);
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut port = lock(&writer);
            port.set_timeout(timeout).map_err(|e| ScannerError::communication(e.to_string()))?;
            port.write_all(&bytes).map_err(|e| io_error(e, timeout))?;
            port.flush().map_err(|e| io_error(e, timeout))?;
            Ok(bytes.len())
        })
        .await
        .map_err(|e| ScannerError::communication(e.to_string()))?
    }

    async fn read(&self, capacity: usize, timeout: Duration) -> Result<Bytes> {
        let reader = Arc::clone(&self.reader);

        tokio::task::spawn_blocking(move || {
            let mut port = lock(&reader);
            port.set_timeout(timeout).map_err(|e| ScannerError::communication(e.to_string()))?;

            let mut buffer = vec![0u8; capacity];
            let n = port.read(&mut buffer).map_err(|e| io_error(e, timeout))?;
            buffer.truncate(n);
            Ok(Bytes::from(buffer))
        })
        .await
        .map_err(|e| ScannerError::communication(e.to_string()))?
    }

    async fn close(&self) -> Result<()> {
        // The port closes when the last handle drops.
        debug!("Closing {}", self.name);
        Ok(())
    }
}
