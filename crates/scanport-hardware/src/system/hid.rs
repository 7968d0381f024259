//! Report pipe over `hidapi`.

use bytes::Bytes;
use hidapi::{HidApi, HidDevice};
use scanport_core::constants::{REPORT_ID, REPORT_PACKET_SIZE};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::{Result, ScannerError, traits::ReportPipe};

/// Bar Code Scanner usage page.
const USAGE_PAGE_POS_SCANNER: u16 = 0x8C;
/// Bar Code Badge Reader usage.
const USAGE_SCANNER: u16 = 0x02;

/// Longest wait inside one blocking read, in milliseconds.
const READ_SLICE_MS: i32 = 250;

const TARGET: &str = "report pipe";

fn hid_error(e: hidapi::HidError) -> ScannerError {
    ScannerError::communication(e.to_string())
}

/// hidapi reports a read failure only when the device handle is no longer
/// usable, typically because the scanner was unplugged.
fn hid_read_error(e: hidapi::HidError) -> ScannerError {
    ScannerError::disconnected(format!("HID scanner ({e})"))
}

/// The first attached HID barcode scanner.
///
/// Reads and writes run on the blocking pool; the device handle is shared
/// between them behind a mutex.
pub struct HidReportPipe {
    device: Arc<Mutex<HidDevice>>,
}

impl std::fmt::Debug for HidReportPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidReportPipe").finish_non_exhaustive()
    }
}

impl HidReportPipe {
    pub(crate) async fn open() -> Result<Self> {
        let device = tokio::task::spawn_blocking(|| -> Result<HidDevice> {
            let api = HidApi::new().map_err(|e| ScannerError::connection(TARGET, e.to_string()))?;
            let info = api
                .device_list()
                .find(|d| d.usage_page() == USAGE_PAGE_POS_SCANNER && d.usage() == USAGE_SCANNER)
                .ok_or_else(|| ScannerError::connection(TARGET, "no HID barcode scanner attached"))?;

            info!(
                "Opening HID scanner {:04x}:{:04x} {}",
                info.vendor_id(),
                info.product_id(),
                info.product_string().unwrap_or("")
            );
            info.open_device(&api)
                .map_err(|e| ScannerError::connection(TARGET, e.to_string()))
        })
        .await
        .map_err(|e| ScannerError::connection(TARGET, e.to_string()))??;

        Ok(Self {
            device: Arc::new(Mutex::new(device)),
        })
    }

    async fn with_device<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&HidDevice) -> Result<T> + Send + 'static,
    {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || {
            let device = device.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            op(&device)
        })
        .await
        .map_err(|e| ScannerError::communication(e.to_string()))?
    }
}

impl ReportPipe for HidReportPipe {
    async fn write_output(&self, report: &[u8]) -> Result<usize> {
        let mut numbered = Vec::with_capacity(report.len() + 1);
        numbered.push(REPORT_ID);
        numbered.extend_from_slice(report);

        let written = self
            .with_device(move |device| device.write(&numbered).map_err(hid_error))
            .await?;
        Ok(written.saturating_sub(1))
    }

    async fn read_input(&self) -> Result<Bytes> {
        let buffer = self
            .with_device(|device| {
                let mut buffer = [0u8; REPORT_PACKET_SIZE + 1];
                let n = device.read_timeout(&mut buffer, READ_SLICE_MS).map_err(hid_read_error)?;
                Ok(buffer[..n].to_vec())
            })
            .await?;

        match buffer.len() {
            0 => Err(ScannerError::timeout(u64::from(READ_SLICE_MS.unsigned_abs()))),
            n if n > REPORT_PACKET_SIZE && buffer[0] == REPORT_ID => {
                debug!("Stripped report ID from {}-byte input report", n);
                Ok(Bytes::copy_from_slice(&buffer[1..]))
            }
            _ => Ok(Bytes::from(buffer)),
        }
    }
}
