//! Ready-made [`EventSink`] implementations.
//!
//! Closures implement [`EventSink`] directly. [`ChannelSink`] hands reads to an
//! async consumer over a bounded channel:
//!
//! ```
//! use scanport_core::{BarcodeEvent, SymbologyCode, Transport};
//! use scanport_hardware::{EventSink, sink::ChannelSink};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (sink, mut events) = ChannelSink::new(16);
//! sink.notify(BarcodeEvent::new(&b"12345678"[..], SymbologyCode::CODE128, Transport::Serial));
//!
//! let event = events.recv().await.unwrap();
//! assert_eq!(event.payload_str(), Some("12345678"));
//! # }
//! ```

use scanport_core::BarcodeEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::traits::EventSink;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Forwards events into a bounded `mpsc` channel.
///
/// The backend never waits on the consumer. When the channel is full the
/// event is dropped and counted.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<BarcodeEvent>,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<BarcodeEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        let sink = Self {
            tx,
            dropped: AtomicU64::new(0),
        };
        (sink, rx)
    }

    /// Events dropped because the consumer fell behind or went away.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY).0
    }
}

impl EventSink for ChannelSink {
    fn notify(&self, event: BarcodeEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Event channel full, dropping {}-byte {} read",
                    event.len(),
                    event.symbology.name()
                );
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Event receiver gone, dropping read");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: BarcodeEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanport_core::{SymbologyCode, Transport};

    fn event(payload: &'static [u8]) -> BarcodeEvent {
        BarcodeEvent::new(payload, SymbologyCode::GENERIC, Transport::Report)
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new(4);
        sink.notify(event(b"one"));
        sink.notify(event(b"two"));

        assert_eq!(rx.recv().await.unwrap().payload_str(), Some("one"));
        assert_eq!(rx.recv().await.unwrap().payload_str(), Some("two"));
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (sink, _rx) = ChannelSink::new(1);
        sink.notify(event(b"kept"));
        sink.notify(event(b"dropped"));
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn test_channel_sink_drops_when_closed() {
        let (sink, rx) = ChannelSink::new(1);
        drop(rx);
        sink.notify(event(b"lost"));
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn test_closure_sink() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = seen.clone();
        let sink = move |e: BarcodeEvent| log.lock().unwrap().push(e.len());

        sink.notify(event(b"abc"));
        NullSink.notify(event(b"ignored"));
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }
}
