use log::trace;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Bounded queue of pending display strings.
///
/// When the queue is full the newest update is dropped, the producer never waits.
#[derive(Clone, Debug)]
pub struct DisplayQueue {
    sender: mpsc::Sender<String>,
}

/// Consuming end of a [`DisplayQueue`].
#[derive(Debug)]
pub struct DisplayReceiver {
    receiver: mpsc::Receiver<String>,
}

impl DisplayQueue {
    pub const DEFAULT_CAPACITY: usize = 4;

    pub fn new(capacity: usize) -> (Self, DisplayReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, DisplayReceiver { receiver })
    }

    /// Queues `text`. Returns `false` if it was dropped.
    pub fn push(&self, text: String) -> bool {
        match self.sender.try_send(text) {
            Ok(()) => true,
            Err(TrySendError::Full(text)) => {
                trace!("Display queue full, dropping update: {}", text);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

impl DisplayReceiver {
    /// Drains everything pending and returns the most recent entry.
    pub fn drain_latest(&mut self) -> Option<String> {
        let mut latest = None;
        while let Ok(text) = self.receiver.try_recv() {
            latest = Some(text);
        }
        latest
    }

    /// Waits for the next entry. Returns `None` once every queue handle is dropped.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}
