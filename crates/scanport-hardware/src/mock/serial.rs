//! Mock serial link.

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::{Result, ScannerError, traits::SerialLink};

/// Scripted result of one read on a [`MockSerialLink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes returned by the read, truncated to the requested capacity.
    Data(Bytes),
    Timeout,
    /// A non-timeout failure, such as a framing error.
    Fail(String),
    Disconnect,
}

/// One entry in the link's journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOp {
    Write(Bytes),
    ReadIssued,
    ReadCompleted,
    /// A read was dropped before its outcome arrived.
    ReadAbandoned,
    Closed,
}

#[derive(Debug, Default)]
struct LinkJournal {
    ops: Mutex<Vec<LinkOp>>,
    fail_writes: AtomicBool,
    stall_writes: AtomicBool,
    closed: AtomicBool,
}

impl LinkJournal {
    fn record(&self, op: LinkOp) {
        self.ops
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(op);
    }

    fn ops(&self) -> Vec<LinkOp> {
        self.ops
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Records an abandoned read unless disarmed first.
struct PendingRead<'a> {
    journal: &'a LinkJournal,
    armed: bool,
}

impl Drop for PendingRead<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.journal.record(LinkOp::ReadAbandoned);
        }
    }
}

/// Serial link whose reads are answered from a script.
///
/// A read waits until the handle pushes a [`ReadOutcome`] for it, however long
/// that takes; the read timeout is not simulated. Every write, read and close
/// is recorded in a journal for later assertions.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use scanport_hardware::SerialLink;
/// use scanport_hardware::mock::{MockSerialLink, ReadOutcome};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> scanport_hardware::Result<()> {
/// let (link, handle) = MockSerialLink::new();
/// handle.push_read(ReadOutcome::Data(Bytes::from_static(b"ACK\r\n")));
///
/// let window = link.read(256, Duration::from_millis(100)).await?;
/// assert_eq!(&window[..], b"ACK\r\n");
/// assert_eq!(handle.reads_issued(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockSerialLink {
    reads: tokio::sync::Mutex<mpsc::UnboundedReceiver<ReadOutcome>>,
    journal: Arc<LinkJournal>,
}

/// Scripts a [`MockSerialLink`] and inspects its journal.
#[derive(Debug, Clone)]
pub struct MockSerialLinkHandle {
    reads: mpsc::UnboundedSender<ReadOutcome>,
    journal: Arc<LinkJournal>,
}

impl MockSerialLink {
    pub fn new() -> (Self, MockSerialLinkHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let journal = Arc::new(LinkJournal::default());

        let link = Self {
            reads: tokio::sync::Mutex::new(rx),
            journal: journal.clone(),
        };
        (link, MockSerialLinkHandle { reads: tx, journal })
    }
}

impl Default for MockSerialLink {
    fn default() -> Self {
        Self::new().0
    }
}

impl SerialLink for MockSerialLink {
    async fn write(&self, bytes: &[u8], _timeout: Duration) -> Result<usize> {
        if self.journal.stall_writes.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        if self.journal.closed.load(Ordering::SeqCst) {
            return Err(ScannerError::disconnected("mock serial link"));
        }
        if self.journal.fail_writes.load(Ordering::SeqCst) {
            return Err(ScannerError::communication("mock write failure"));
        }

        self.journal.record(LinkOp::Write(Bytes::copy_from_slice(bytes)));
        Ok(bytes.len())
    }

    async fn read(&self, capacity: usize, timeout: Duration) -> Result<Bytes> {
        self.journal.record(LinkOp::ReadIssued);
        let mut pending = PendingRead {
            journal: &self.journal,
            armed: true,
        };

        let outcome = self.reads.lock().await.recv().await;
        pending.armed = false;
        self.journal.record(LinkOp::ReadCompleted);

        match outcome {
            Some(ReadOutcome::Data(mut bytes)) => {
                bytes.truncate(capacity);
                Ok(bytes)
            }
            Some(ReadOutcome::Timeout) => Err(ScannerError::timeout_after(timeout)),
            Some(ReadOutcome::Fail(message)) => Err(ScannerError::communication(message)),
            Some(ReadOutcome::Disconnect) | None => {
                Err(ScannerError::disconnected("mock serial link"))
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.journal.closed.store(true, Ordering::SeqCst);
        self.journal.record(LinkOp::Closed);
        Ok(())
    }
}

impl MockSerialLinkHandle {
    /// Queue the outcome of the next read.
    pub fn push_read(&self, outcome: ReadOutcome) {
        let _ = self.reads.send(outcome);
    }

    pub fn journal(&self) -> Vec<LinkOp> {
        self.journal.ops()
    }

    /// Bytes of every successful write, in order.
    pub fn writes(&self) -> Vec<Bytes> {
        self.journal
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                LinkOp::Write(bytes) => Some(bytes),
                _ => None,
            })
            .collect()
    }

    pub fn reads_issued(&self) -> usize {
        self.journal
            .ops()
            .iter()
            .filter(|op| **op == LinkOp::ReadIssued)
            .count()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.journal.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes hang until dropped.
    pub fn set_stall_writes(&self, stall: bool) {
        self.journal.stall_writes.store(stall, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.journal.closed.load(Ordering::SeqCst)
    }
}
