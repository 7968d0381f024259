use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

/// A spawned task paired with the token that tells it to exit.
///
/// Dropping the value cancels the task without waiting for it.
#[derive(Debug)]
pub(crate) struct BackgroundTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub(crate) fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(body(cancel.clone()));
        trace!("Spawned {} task", name);

        Self {
            name,
            cancel,
            handle,
        }
    }

    /// Cancel the task and wait until it has exited.
    pub(crate) async fn stop(mut self) {
        self.cancel.cancel();

        match (&mut self.handle).await {
            Ok(()) => trace!("{} task exited", self.name),
            Err(e) if e.is_panic() => error!("{} task panicked: {}", self.name, e),
            Err(_) => trace!("{} task aborted", self.name),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
