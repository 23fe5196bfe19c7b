use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use common::ImuType;

use crate::constants::*;
use crate::supervisor::FaultResetPolicy;

/// Which IMU to read from and where to find it. Refreshable at runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceConfig {
    pub imu_type: ImuType,
    pub phone_ip: String,
    pub phone_port: u16,
    pub replay_file: Option<PathBuf>,
}

impl SourceConfig {
    pub fn new(imu_type: ImuType, phone_ip: &str) -> Self {
        Self {
            imu_type,
            phone_ip: phone_ip.to_string(),
            phone_port: DEFAULT_PHONE_PORT,
            replay_file: None,
        }
    }

    /// WebSocket endpoint streaming `channel` from the phone.
    pub fn phone_url(&self, channel: &str) -> String {
        format!(
            "ws://{}:{}/sensor/connect?type={}",
            self.phone_ip, self.phone_port, channel
        )
    }
}

/// Timings and limits of the acquisition loop. Fixed for the lifetime of a bridge.
#[derive(Clone, Debug)]
pub struct BridgeSettings {
    pub baud_rate: u32,
    pub serial_read_timeout: Duration,
    pub connect_cooldown: Duration,
    pub poll_interval: Duration,
    pub recovery_interval: Duration,
    pub max_faults: u32,
    pub fault_reset_policy: FaultResetPolicy,
    pub sensor_channel: String,
    pub network_frame_timeout: Duration,
    pub replay_period: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            serial_read_timeout: Duration::from_millis(SERIAL_READ_TIMEOUT_MS),
            connect_cooldown: Duration::from_millis(CONNECT_COOLDOWN_MS),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            recovery_interval: Duration::from_secs(RECOVERY_INTERVAL_SECS),
            max_faults: MAX_FAULTS,
            fault_reset_policy: FaultResetPolicy::Never,
            sensor_channel: DEFAULT_SENSOR_CHANNEL.to_string(),
            network_frame_timeout: Duration::from_millis(NETWORK_FRAME_TIMEOUT_MS),
            replay_period: Duration::from_millis(REPLAY_PERIOD_MS),
        }
    }
}

/// Configuration shared between the acquisition loop and its collaborators.
///
/// The loop only reads the source selection. External commands replace it
/// (config refresh) and toggle the calibration flag.
#[derive(Debug)]
pub struct SharedConfig {
    source: RwLock<SourceConfig>,
    calibrating: AtomicBool,
}

impl SharedConfig {
    pub fn new(source: SourceConfig) -> Self {
        Self {
            source: RwLock::new(source),
            calibrating: AtomicBool::new(false),
        }
    }

    pub fn source(&self) -> SourceConfig {
        self.source
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn imu_type(&self) -> ImuType {
        self.source
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .imu_type
    }

    /// Replaces the source selection. Returns the previous one.
    pub fn replace_source(&self, source: SourceConfig) -> SourceConfig {
        let mut guard = self
            .source
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, source)
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating.load(Ordering::Acquire)
    }

    pub fn set_calibrating(&self, calibrating: bool) {
        self.calibrating.store(calibrating, Ordering::Release);
    }
}
