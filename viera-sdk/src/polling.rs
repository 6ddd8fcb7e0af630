//! Periodic status checks
//!
//! A [`PollingTask`] runs [`DeviceController::check_status`] right away and then
//! once per interval until shut down. A check that overruns delays the next one;
//! checks never overlap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::controller::DeviceController;

/// Default interval between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Background status polling for one device
#[derive(Debug)]
pub struct PollingTask {
    interval: Duration,
    task_handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    poll_count: Arc<AtomicU64>,
}

impl PollingTask {
    /// Spawn the polling loop on the current runtime
    pub fn start(controller: Arc<DeviceController>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poll_count = Arc::new(AtomicU64::new(0));

        let task_poll_count = Arc::clone(&poll_count);
        let task_handle = tokio::spawn(async move {
            Self::polling_loop(controller, interval, shutdown_rx, task_poll_count).await;
        });

        Self {
            interval,
            task_handle,
            shutdown_tx,
            poll_count,
        }
    }

    async fn polling_loop(
        controller: Arc<DeviceController>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
        poll_count: Arc<AtomicU64>,
    ) {
        let host = controller.client().endpoint().host();
        info!(%host, ?interval, "starting status polling");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let report = controller.check_status().await;
            poll_count.fetch_add(1, Ordering::SeqCst);
            debug!(%host, ?report, "status check finished");

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown_rx.changed() => {
                    // A dropped sender also means stop
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!(%host, "status polling stopped");
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of completed status checks
    pub fn poll_count(&self) -> u64 {
        self.poll_count.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }

    /// Stop polling and wait for an in-progress check to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task_handle.await;
    }
}
