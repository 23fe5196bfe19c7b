//! Text display of the latest reading.
//!
//! Samples are formatted on the publishing side and pushed through a
//! [`DisplayQueue`]. The display task refreshes at a fixed period, shows only
//! the most recent entry and stops with the shutdown signal.

use log::{debug, warn};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use bridge_rs::models::shutdown::Shutdown;
use common::ImuSample;
use publisher::{Broadcaster, DisplayQueue, DisplayReceiver, Listener};

pub const WAITING_TEXT: &str = "Waiting for IMU data...";
pub const REFRESH_PERIOD_MS: u64 = 50;

/// Forwards every published sample to `queue` as display text.
pub fn attach(broadcaster: &Broadcaster<ImuSample>, queue: DisplayQueue) -> Uuid {
    let mut listener = Listener::new(move |_id: Uuid, sample: Arc<ImuSample>| {
        queue.push(sample.to_string());
    });
    broadcaster.register_listener(&mut listener)
}

/// Writes the newest queued text to `out` every `refresh` until shutdown.
///
/// Returns the writer once stopped.
pub fn spawn_display<W>(
    mut receiver: DisplayReceiver,
    mut out: W,
    refresh: Duration,
    shutdown: Shutdown,
) -> JoinHandle<W>
where
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        let mut shown = WAITING_TEXT.to_string();
        if let Err(e) = writeln!(out, "{}", shown) {
            warn!("Display write failed: {}", e);
        }

        let mut ticker = tokio::time::interval(refresh);
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }
            if let Some(text) = receiver.drain_latest() {
                if text != shown {
                    if let Err(e) = writeln!(out, "{}", text).and_then(|_| out.flush()) {
                        warn!("Display write failed: {}", e);
                    }
                    shown = text;
                }
            }
        }
        debug!("Display closed");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_display_shows_latest_sample() {
        let broadcaster = Broadcaster::new();
        let (queue, receiver) = DisplayQueue::new(DisplayQueue::DEFAULT_CAPACITY);
        attach(&broadcaster, queue);

        let shutdown = Shutdown::new();
        let handle = spawn_display(
            receiver,
            Vec::new(),
            Duration::from_millis(5),
            shutdown.clone(),
        );

        broadcaster.publish(ImuSample::new([1, 2, 3], [4, 5, 6]));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        let out = String::from_utf8(handle.await.unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], WAITING_TEXT);
        assert_eq!(
            lines.last().copied(),
            Some("Accel(x,y,z): (1, 2, 3)  Gyro(x,y,z): (4, 5, 6)")
        );
    }

    #[tokio::test]
    async fn test_display_stops_on_shutdown() {
        let (_queue, receiver) = DisplayQueue::new(1);
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let handle = spawn_display(receiver, Vec::new(), Duration::from_secs(60), shutdown);
        let out = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), WAITING_TEXT);
    }
}
