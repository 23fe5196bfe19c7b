use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;

use common::ImuType;

use crate::codec;
use crate::errors::BridgeError;
use crate::ports::{PollOutcome, SourceDriver, Transport};

/// Source read synchronously from the acquisition loop, one frame per poll.
///
/// Used for serial devices and replayed recordings.
pub struct DirectLink<T: Transport> {
    transport: T,
    imu_type: ImuType,
    read_timeout: Duration,
}

impl<T: Transport> DirectLink<T> {
    pub fn new(transport: T, imu_type: ImuType, read_timeout: Duration) -> Self {
        Self {
            transport,
            imu_type,
            read_timeout,
        }
    }
}

#[async_trait]
impl<T: Transport> SourceDriver for DirectLink<T> {
    async fn connect(&mut self) -> Result<(), BridgeError> {
        let descriptor = self.transport.discover().await?;
        debug!("Opening {} source at {}", self.imu_type, descriptor);
        self.transport.open(&descriptor).await
    }

    async fn poll(&mut self) -> Result<PollOutcome, BridgeError> {
        let raw = match self.transport.read_frame(self.read_timeout).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(PollOutcome::Idle),
            Err(e) => {
                if !e.is_unexpected() {
                    self.transport.close().await;
                }
                return Err(e);
            }
        };

        match codec::decode(self.transport.frame_format(), &raw) {
            Ok(Some(sample)) => Ok(PollOutcome::Sample(sample)),
            Ok(None) => Ok(PollOutcome::Idle),
            Err(e) => {
                warn!("Dropping frame: {}", e);
                Ok(PollOutcome::Idle)
            }
        }
    }

    async fn close(&mut self) {
        self.transport.close().await;
    }

    fn imu_type(&self) -> ImuType {
        self.imu_type
    }
}
