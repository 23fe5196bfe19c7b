use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct ShutdownState {
    notify: Notify,
    triggered: AtomicBool,
}

/// Process wide stop request. Cloning shares the same signal.
///
/// Once triggered it stays triggered, so late observers never miss it.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    state: Arc<ShutdownState>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.state.triggered.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.state.triggered.load(Ordering::Acquire)
    }

    /// Resolves once the signal is triggered.
    pub async fn wait(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Sleeps for `duration` unless triggered first. Returns false if interrupted.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.wait() => false,
            _ = tokio::time::sleep(duration) => !self.is_triggered(),
        }
    }
}

/// Triggers `shutdown` on Ctrl+C, or after `run_for_millis` if given.
pub fn listen_for_shutdown(
    shutdown: Shutdown,
    run_for_millis: Option<u64>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(time_to_live_millis) = run_for_millis {
            tokio::select! {
                _ = shutdown.wait() => return,
                _ = tokio::time::sleep(Duration::from_millis(time_to_live_millis)) => {}
            }
        } else {
            tokio::select! {
                _ = shutdown.wait() => return,
                result = signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!("Error while waiting for Ctrl+C: {}", e);
                        return;
                    }
                    info!("Ctrl+C received. Sending stop signal...");
                }
            }
        }
        shutdown.trigger();
    })
}
