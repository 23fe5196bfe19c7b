use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Source of IMU data selected by configuration.
///
/// # Examples
///
/// ```
/// use common::ImuType;
///
/// assert_eq!(ImuType::try_from("esp32").unwrap(), ImuType::Esp32);
/// assert_eq!(ImuType::try_from("Phone").unwrap(), ImuType::Phone);
/// assert!(ImuType::try_from("watch").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImuType {
    /// Microcontroller streaming tab separated frames over a serial port.
    Esp32,
    /// Smartphone streaming accelerometer messages over a WebSocket.
    Phone,
    /// Recorded log file played back as if it were a serial device.
    Replay,
}

impl ImuType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImuType::Esp32 => "ESP32",
            ImuType::Phone => "Phone",
            ImuType::Replay => "Replay",
        }
    }
}

impl TryFrom<&str> for ImuType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "esp32" => Ok(ImuType::Esp32),
            "phone" => Ok(ImuType::Phone),
            "replay" => Ok(ImuType::Replay),
            other => Err(format!("Unknown IMU type: {}", other)),
        }
    }
}

impl fmt::Display for ImuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ImuType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImuType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ImuType::try_from(value.as_str()).map_err(serde::de::Error::custom)
    }
}
