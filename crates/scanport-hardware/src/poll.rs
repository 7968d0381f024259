//! Serial poll cycle.
//!
//! A periodic tick issues a read of up to 256 bytes whenever no read is
//! outstanding. Reads run as separate tasks and report back over a channel, so
//! a slow read never delays the ticker; a tick that finds a read outstanding
//! does nothing. Cancelling the cycle aborts any read in flight, and a
//! completion that arrives after cancellation is never applied.

use bytes::Bytes;
use scanport_core::constants::SERIAL_CAPTURE_CAPACITY;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::{Result, serial::SerialShared, traits::SerialLink};

pub(crate) async fn run_poll_cycle<L: SerialLink>(
    shared: Arc<SerialShared<L>>,
    link: Arc<L>,
    cancel: CancellationToken,
) {
    let period = shared.timing.poll_period();
    let read_timeout = shared.timing.read_timeout();

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let (done_tx, mut done_rx) = mpsc::channel::<Result<Bytes>>(1);
    let mut reads = JoinSet::new();

    debug!("Poll cycle armed ({}ms)", period.as_millis());

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            Some(outcome) = done_rx.recv() => shared.on_read_complete(outcome),

            Some(joined) = reads.join_next(), if !reads.is_empty() => {
                if let Err(e) = joined
                    && e.is_panic()
                {
                    shared.stats.record_error();
                    shared.release_read();
                    error!("Serial read task panicked: {}", e);
                }
            }

            _ = ticker.tick() => {
                if !shared.try_claim_read() {
                    trace!("Read outstanding, skipping tick");
                    continue;
                }

                let link = Arc::clone(&link);
                let done = done_tx.clone();
                reads.spawn(async move {
                    let outcome = link.read(SERIAL_CAPTURE_CAPACITY, read_timeout).await;
                    // Receiver is gone only once the cycle has been cancelled.
                    let _ = done.send(outcome).await;
                });
            }
        }
    }

    reads.abort_all();
    while reads.join_next().await.is_some() {}
    shared.release_read();

    debug!("Poll cycle disarmed");
}
