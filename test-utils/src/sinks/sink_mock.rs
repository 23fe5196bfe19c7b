use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use common::ImuSample;
use publisher::{listener, Broadcaster, PublisherError};

/// Records every sample pushed by a [`Broadcaster`].
#[derive(Clone, Default)]
pub struct SinkMock {
    received: Arc<Mutex<Vec<ImuSample>>>,
}

impl SinkMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, broadcaster: &Broadcaster<ImuSample>) -> Uuid {
        let mut listener = listener!(self.process_sample);
        broadcaster.register_listener(&mut listener)
    }

    pub fn detach(
        &self,
        broadcaster: &Broadcaster<ImuSample>,
        id: Uuid,
    ) -> Result<(), PublisherError> {
        broadcaster.unregister_listener(id)
    }

    pub fn process_sample(&self, _id: Uuid, sample: Arc<ImuSample>) {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(*sample);
    }

    pub fn samples(&self) -> Vec<ImuSample> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Waits until at least `count` samples arrived. Returns false on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.samples().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.samples().len() >= count
    }
}

impl std::fmt::Debug for SinkMock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkMock")
            .field("received", &self.samples().len())
            .finish()
    }
}
