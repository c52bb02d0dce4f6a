//! Periodic refresh of sale state.
//!
//! A [`SalePoller`] owns one tokio task that reads [`SaleSnapshot`]s from the
//! contract on a fixed interval and publishes the latest one on a watch
//! channel. The task stops when its [`CancellationToken`] fires, either
//! through [`PollerHandle::shutdown`] or when the handle is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::chain::MintContract;
use crate::sale::SaleSnapshot;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Shorter intervals, including zero, are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub struct SalePoller;

impl SalePoller {
    /// Starts polling. The first read happens immediately.
    pub fn spawn(
        contract: Arc<dyn MintContract>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> PollerHandle {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run(contract, interval, cancel.clone(), tx));
        PollerHandle {
            cancel,
            rx,
            task: Some(task),
        }
    }
}

async fn run(
    contract: Arc<dyn MintContract>,
    interval: Duration,
    cancel: CancellationToken,
    tx: watch::Sender<Option<SaleSnapshot>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Sale poller cancelled");
                break;
            }
            _ = ticker.tick() => {
                let result = tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = contract.snapshot() => result,
                };
                match result {
                    Ok(snapshot) => {
                        tracing::trace!(?snapshot, "Polled sale state");
                        tx.send_replace(Some(snapshot));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to poll sale state");
                    }
                }
            }
        }
    }
}

/// Handle to a running poller. Dropping it cancels the task.
pub struct PollerHandle {
    cancel: CancellationToken,
    rx: watch::Receiver<Option<SaleSnapshot>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Latest snapshot, `None` until the first successful poll.
    pub fn latest(&self) -> Option<SaleSnapshot> {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SaleSnapshot>> {
        self.rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancels the task and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Sale poller task failed");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
