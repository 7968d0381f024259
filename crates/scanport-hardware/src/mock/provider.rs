//! Mock connection provider.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use super::{MockReportPipe, MockSerialLink};
use crate::{Result, ScannerError, traits::ConnectionProvider, types::LineSettings};

/// Hands out pre-built mock connections in the order they were supplied.
///
/// Opening a transport with nothing queued fails with a connection error, as
/// does every serial open on a provider built with
/// [`failing_serial`](Self::failing_serial).
#[derive(Debug, Default)]
pub struct MockProvider {
    pipes: Mutex<VecDeque<MockReportPipe>>,
    links: Mutex<VecDeque<MockSerialLink>>,
    serial_failure: Option<String>,
    serial_opens: Mutex<Vec<(u8, LineSettings)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose serial ports never open.
    pub fn failing_serial(message: impl Into<String>) -> Self {
        Self {
            serial_failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_report_pipe(self, pipe: MockReportPipe) -> Self {
        self.add_report_pipe(pipe);
        self
    }

    pub fn with_serial_link(self, link: MockSerialLink) -> Self {
        self.add_serial_link(link);
        self
    }

    pub fn add_report_pipe(&self, pipe: MockReportPipe) {
        lock(&self.pipes).push_back(pipe);
    }

    pub fn add_serial_link(&self, link: MockSerialLink) {
        lock(&self.links).push_back(link);
    }

    /// Port number and line settings of every serial open attempted.
    pub fn serial_opens(&self) -> Vec<(u8, LineSettings)> {
        lock(&self.serial_opens).clone()
    }
}

impl ConnectionProvider for MockProvider {
    type Pipe = MockReportPipe;
    type Link = MockSerialLink;

    async fn open_report_pipe(&self) -> Result<MockReportPipe> {
        lock(&self.pipes)
            .pop_front()
            .ok_or_else(|| ScannerError::connection("report pipe", "no scanner attached"))
    }

    async fn open_serial(&self, port_number: u8, settings: LineSettings) -> Result<MockSerialLink> {
        lock(&self.serial_opens).push((port_number, settings));

        if let Some(message) = &self.serial_failure {
            return Err(ScannerError::connection(
                format!("serial port {port_number}"),
                message.clone(),
            ));
        }
        lock(&self.links)
            .pop_front()
            .ok_or_else(|| ScannerError::connection(format!("serial port {port_number}"), "no such port"))
    }
}
