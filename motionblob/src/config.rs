//! JSON configuration file shared with the settings front-end.
//!
//! ```json
//! { "IMU_TYPE": "ESP32", "PHONE_IP": "192.168.1.20" }
//! ```
//!
//! `PHONE_PORT` and `REPLAY_FILE` are optional. A relative `REPLAY_FILE` is
//! resolved against the directory holding the configuration file.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use bridge_rs::models::SourceConfig;
use common::ImuType;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The file could not be read.
    Io(String),
    /// The file is not valid JSON or misses a required key.
    Parse(String),
    /// A key holds a value the bridge cannot use.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "cannot read configuration: {}", msg),
            ConfigError::Parse(msg) => write!(f, "invalid configuration: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "unsupported configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "IMU_TYPE")]
    imu_type: String,
    #[serde(rename = "PHONE_IP", default)]
    phone_ip: String,
    #[serde(rename = "PHONE_PORT")]
    phone_port: Option<u16>,
    #[serde(rename = "REPLAY_FILE")]
    replay_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file and returns the source selection it describes.
    pub async fn load(&self) -> Result<SourceConfig, ConfigError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::Io(format!("{}: {}", self.path.display(), e)))?;
        let mut source = parse(&contents)?;
        if let Some(file) = source.replay_file.take() {
            let base = self.path.parent().unwrap_or_else(|| Path::new(""));
            source.replay_file = Some(base.join(file));
        }
        Ok(source)
    }
}

pub fn parse(contents: &str) -> Result<SourceConfig, ConfigError> {
    let raw: RawConfig =
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let imu_type = ImuType::try_from(raw.imu_type.as_str()).map_err(ConfigError::Invalid)?;

    let mut source = SourceConfig::new(imu_type, raw.phone_ip.trim());
    if let Some(port) = raw.phone_port {
        source.phone_port = port;
    }
    source.replay_file = raw.replay_file;
    Ok(source)
}
