use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use common::{ImuSample, ImuType};
use publisher::Broadcaster;

use crate::codec::FrameFormat;
use crate::errors::BridgeError;
use crate::models::shutdown::Shutdown;
use crate::models::{SourceConfig, TransportDescriptor};

/// Raw frame channel to one IMU.
#[async_trait]
pub trait Transport: Send {
    /// Finds the endpoint to open.
    /// Returns NoDeviceFound if nothing suitable is available.
    async fn discover(&mut self) -> Result<TransportDescriptor, BridgeError>;

    /// Opens `descriptor`. Returns OpenFailed if the endpoint exists but cannot be opened.
    async fn open(&mut self, descriptor: &TransportDescriptor) -> Result<(), BridgeError>;

    /// Waits at most `timeout` for one frame.
    ///
    /// `Ok(None)` means nothing arrived, the link is idle but healthy. A broken
    /// link is closed and reported as LinkLost.
    async fn read_frame(&mut self, timeout: Duration) -> Result<Option<String>, BridgeError>;

    async fn close(&mut self);

    fn is_open(&self) -> bool;

    fn frame_format(&self) -> FrameFormat;
}

/// Result of one poll of a source.
#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// A new sample was read and decoded.
    Sample(ImuSample),
    /// A background listener is alive and has delivered samples.
    Streaming,
    /// Nothing new this cycle. Idle link, blank line or undecodable frame.
    Idle,
}

/// Connect/poll/close capability of one kind of IMU source.
#[async_trait]
pub trait SourceDriver: Send {
    /// Discovers and opens the source.
    async fn connect(&mut self) -> Result<(), BridgeError>;

    /// Runs one read cycle. Any error other than Unexpected means the link is gone.
    async fn poll(&mut self) -> Result<PollOutcome, BridgeError>;

    async fn close(&mut self);

    fn imu_type(&self) -> ImuType;
}

/// Handles a driver needs when it publishes samples on its own.
#[derive(Clone)]
pub struct DriverContext {
    pub broadcaster: Arc<Broadcaster<ImuSample>>,
    pub shutdown: Shutdown,
}

/// Builds the driver matching a source selection.
pub trait SourceFactory: Send + Sync {
    fn build(
        &self,
        source: &SourceConfig,
        context: &DriverContext,
    ) -> Result<Box<dyn SourceDriver>, BridgeError>;
}

impl<F> SourceFactory for F
where
    F: Fn(&SourceConfig, &DriverContext) -> Result<Box<dyn SourceDriver>, BridgeError>
        + Send
        + Sync,
{
    fn build(
        &self,
        source: &SourceConfig,
        context: &DriverContext,
    ) -> Result<Box<dyn SourceDriver>, BridgeError> {
        self(source, context)
    }
}

/// Wraps a closure as a [`SourceFactory`], letting the compiler infer its signature.
pub fn source_factory<F>(factory: F) -> F
where
    F: Fn(&SourceConfig, &DriverContext) -> Result<Box<dyn SourceDriver>, BridgeError>
        + Send
        + Sync,
{
    factory
}
