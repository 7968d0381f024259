//! Mock report pipe.

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::{Result, ScannerError, traits::ReportPipe};

/// Report pipe fed from a channel.
///
/// Input reports and failures pushed through the [`MockReportPipeHandle`] are
/// returned by [`ReportPipe::read_input`] in order. Once every handle is
/// dropped, reads fail with [`ScannerError::Disconnected`].
///
/// # Examples
///
/// ```
/// use scanport_hardware::ReportPipe;
/// use scanport_hardware::mock::MockReportPipe;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> scanport_hardware::Result<()> {
/// let (pipe, handle) = MockReportPipe::new();
///
/// handle.push_report(vec![0u8; 64]);
/// assert_eq!(pipe.read_input().await?.len(), 64);
///
/// pipe.write_output(&[17, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).await?;
/// assert_eq!(handle.written()[0][0], 17);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockReportPipe {
    input_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<Bytes>>>,
    written: Arc<Mutex<Vec<Bytes>>>,
    fail_writes: Arc<AtomicBool>,
}

/// Scripts a [`MockReportPipe`].
#[derive(Debug, Clone)]
pub struct MockReportPipeHandle {
    input_tx: mpsc::UnboundedSender<Result<Bytes>>,
    written: Arc<Mutex<Vec<Bytes>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MockReportPipe {
    pub fn new() -> (Self, MockReportPipeHandle) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let written = Arc::new(Mutex::new(Vec::new()));
        let fail_writes = Arc::new(AtomicBool::new(false));

        let pipe = Self {
            input_rx: tokio::sync::Mutex::new(input_rx),
            written: written.clone(),
            fail_writes: fail_writes.clone(),
        };
        let handle = MockReportPipeHandle {
            input_tx,
            written,
            fail_writes,
        };
        (pipe, handle)
    }
}

impl Default for MockReportPipe {
    fn default() -> Self {
        Self::new().0
    }
}

impl ReportPipe for MockReportPipe {
    async fn write_output(&self, report: &[u8]) -> Result<usize> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ScannerError::communication("mock output report rejected"));
        }
        self.written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Bytes::copy_from_slice(report));
        Ok(report.len())
    }

    async fn read_input(&self) -> Result<Bytes> {
        self.input_rx
            .lock()
            .await
            .recv()
            .await
            .unwrap_or_else(|| Err(ScannerError::disconnected("mock report pipe")))
    }
}

impl MockReportPipeHandle {
    /// Queue an input report. Ignored if the pipe is gone.
    pub fn push_report(&self, report: impl Into<Bytes>) {
        let _ = self.input_tx.send(Ok(report.into()));
    }

    /// Make the next read fail with `error`.
    pub fn push_failure(&self, error: ScannerError) {
        let _ = self.input_tx.send(Err(error));
    }

    /// Every output report written so far.
    pub fn written(&self) -> Vec<Bytes> {
        self.written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}
