//! Shared helpers for the hardware integration tests.
//!
//! Each helper wires a [`ScannerManager`] to mocks and hands back whatever the
//! test needs to drive and observe it.

#![allow(dead_code)]

use scanport_core::BarcodeEvent;
use scanport_hardware::mock::{
    MockProvider, MockReportPipe, MockReportPipeHandle, MockSerialLink, MockSerialLinkHandle,
};
use scanport_hardware::{ChannelSink, ScannerManager, ScannerOptions};
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Rig {
    pub manager: ScannerManager<MockProvider>,
    pub events: Receiver<BarcodeEvent>,
    pub pipe: MockReportPipeHandle,
    pub link: MockSerialLinkHandle,
}

/// A manager whose provider holds one report pipe and one serial link.
pub fn rig(options: ScannerOptions) -> Rig {
    init_tracing();

    let (pipe, pipe_handle) = MockReportPipe::new();
    let (link, link_handle) = MockSerialLink::new();
    let provider = MockProvider::new()
        .with_report_pipe(pipe)
        .with_serial_link(link);
    let (sink, events) = ChannelSink::new(16);

    Rig {
        manager: ScannerManager::with_options(provider, sink, options),
        events,
        pipe: pipe_handle,
        link: link_handle,
    }
}

/// Receive the next event, failing the test after one second.
pub async fn next_event(events: &mut Receiver<BarcodeEvent>) -> BarcodeEvent {
    tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("no event within 1s")
        .expect("event channel closed")
}
