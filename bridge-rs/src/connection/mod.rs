//! Source lifecycle: building the driver for the configured IMU type,
//! connecting it, polling it and tearing it down.

pub mod direct;
pub mod listener;

pub use direct::DirectLink;
pub use listener::{SupervisedListener, TransportFactory};

use log::{info, warn};
use std::sync::Arc;

use common::ImuType;

use crate::adapters::{ReplayTransport, SerialTransport, WebSocketTransport};
use crate::errors::BridgeError;
use crate::models::{BridgeSettings, SharedConfig};
use crate::ports::{
    source_factory, DriverContext, PollOutcome, SourceDriver, SourceFactory, Transport,
};

/// Builds serial, phone and replay drivers backed by real transports.
pub fn default_factory(settings: BridgeSettings) -> impl SourceFactory {
    source_factory(move |source, context| {
        let driver: Box<dyn SourceDriver> = match source.imu_type {
            ImuType::Esp32 => Box::new(DirectLink::new(
                SerialTransport::new(settings.baud_rate, settings.serial_read_timeout),
                ImuType::Esp32,
                settings.serial_read_timeout,
            )),
            ImuType::Phone => {
                if source.phone_ip.trim().is_empty() {
                    return Err(BridgeError::NoDeviceFound(
                        "PHONE_IP is not configured".to_string(),
                    ));
                }
                let url = source.phone_url(&settings.sensor_channel);
                let make_transport: TransportFactory =
                    Arc::new(move || Box::new(WebSocketTransport::new(&url)) as Box<dyn Transport>);
                Box::new(SupervisedListener::new(
                    ImuType::Phone,
                    make_transport,
                    context,
                    &settings,
                ))
            }
            ImuType::Replay => Box::new(DirectLink::new(
                ReplayTransport::new(source.replay_file.clone(), settings.replay_period),
                ImuType::Replay,
                settings.serial_read_timeout,
            )),
        };
        Ok(driver)
    })
}

/// Owns the active source driver.
///
/// Reports success or failure only. Phase transitions belong to the
/// acquisition machine.
pub struct ConnectionManager {
    config: Arc<SharedConfig>,
    factory: Box<dyn SourceFactory>,
    context: DriverContext,
    driver: Option<Box<dyn SourceDriver>>,
}

impl ConnectionManager {
    pub fn new(
        config: Arc<SharedConfig>,
        factory: Box<dyn SourceFactory>,
        context: DriverContext,
    ) -> Self {
        Self {
            config,
            factory,
            context,
            driver: None,
        }
    }

    /// Drops any open source and connects the one currently configured.
    pub async fn connect(&mut self) -> Result<(), BridgeError> {
        self.close().await;

        let source = self.config.source();
        let mut driver = self.factory.build(&source, &self.context)?;
        if let Err(e) = driver.connect().await {
            driver.close().await;
            return Err(e);
        }
        info!("Connected to {} source", driver.imu_type());
        self.driver = Some(driver);
        Ok(())
    }

    /// Runs one read cycle on the open source.
    ///
    /// Link failures close the driver before they are returned. A changed
    /// source selection is reported as a lost link so the caller rediscovers.
    pub async fn poll(&mut self) -> Result<PollOutcome, BridgeError> {
        let driver = self
            .driver
            .as_mut()
            .ok_or(BridgeError::LinkLost("no source is open".to_string()))?;

        let configured = self.config.imu_type();
        if driver.imu_type() != configured {
            info!(
                "Source type changed from {} to {}",
                driver.imu_type(),
                configured
            );
            self.close().await;
            return Err(BridgeError::LinkLost(format!(
                "source type changed to {}",
                configured
            )));
        }

        match driver.poll().await {
            Err(e) if !e.is_unexpected() => {
                warn!("Lost {} source: {}", configured, e);
                self.close().await;
                Err(e)
            }
            other => other,
        }
    }

    pub async fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.close().await;
        }
    }

    /// Type of the open source, if any.
    pub fn active_type(&self) -> Option<ImuType> {
        self.driver.as_ref().map(|driver| driver.imu_type())
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockEvent, MockScript};
    use crate::codec::FrameFormat;
    use crate::models::shutdown::Shutdown;
    use crate::models::SourceConfig;
    use publisher::Broadcaster;

    fn manager(script: &MockScript, imu_type: ImuType) -> (ConnectionManager, Arc<SharedConfig>) {
        let config = Arc::new(SharedConfig::new(SourceConfig::new(imu_type, "127.0.0.1")));
        let context = DriverContext {
            broadcaster: Arc::new(Broadcaster::new()),
            shutdown: Shutdown::new(),
        };
        let factory = script.factory(BridgeSettings::default());
        (
            ConnectionManager::new(config.clone(), Box::new(factory), context),
            config,
        )
    }

    #[tokio::test]
    async fn test_poll_without_connect_is_link_lost() {
        let script = MockScript::new(FrameFormat::TabSeparated);
        let (mut manager, _) = manager(&script, ImuType::Esp32);
        assert!(matches!(
            manager.poll().await,
            Err(BridgeError::LinkLost(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_no_driver() {
        let script = MockScript::new(FrameFormat::TabSeparated);
        script.push_connect_result(Err(BridgeError::OpenFailed("busy".into())));
        let (mut manager, _) = manager(&script, ImuType::Esp32);

        assert!(manager.connect().await.is_err());
        assert!(!manager.is_connected());
        assert_eq!(manager.active_type(), None);
    }

    #[tokio::test]
    async fn test_link_loss_drops_driver() {
        let script = MockScript::new(FrameFormat::TabSeparated);
        script.push_event(MockEvent::LinkLost);
        let (mut manager, _) = manager(&script, ImuType::Esp32);

        manager.connect().await.unwrap();
        assert_eq!(manager.active_type(), Some(ImuType::Esp32));
        assert!(manager.poll().await.is_err());
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_unexpected_failure_keeps_driver() {
        let script = MockScript::new(FrameFormat::TabSeparated);
        script.push_event(MockEvent::Unexpected("boom".into()));
        let (mut manager, _) = manager(&script, ImuType::Esp32);

        manager.connect().await.unwrap();
        assert!(matches!(
            manager.poll().await,
            Err(BridgeError::Unexpected(_))
        ));
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn test_source_change_forces_rediscovery() {
        let script = MockScript::new(FrameFormat::TabSeparated);
        let (mut manager, config) = manager(&script, ImuType::Esp32);

        manager.connect().await.unwrap();
        config.replace_source(SourceConfig::new(ImuType::Phone, "10.0.0.2"));

        assert!(matches!(
            manager.poll().await,
            Err(BridgeError::LinkLost(_))
        ));
        assert!(!manager.is_connected());
        assert_eq!(script.close_calls(), 1);

        script.push_frame("1\t2\t3\t4\t5\t6");
        manager.connect().await.unwrap();
        assert_eq!(manager.active_type(), Some(ImuType::Phone));
        assert_eq!(manager.poll().await.unwrap(), PollOutcome::Streaming);
        manager.close().await;
    }

    #[tokio::test]
    async fn test_default_factory_requires_phone_ip() {
        let factory = default_factory(BridgeSettings::default());
        let context = DriverContext {
            broadcaster: Arc::new(Broadcaster::new()),
            shutdown: Shutdown::new(),
        };
        let result = factory.build(&SourceConfig::new(ImuType::Phone, " "), &context);
        assert!(matches!(result, Err(BridgeError::NoDeviceFound(_))));

        let driver = factory
            .build(&SourceConfig::new(ImuType::Esp32, ""), &context)
            .unwrap();
        assert_eq!(driver.imu_type(), ImuType::Esp32);
    }
}
