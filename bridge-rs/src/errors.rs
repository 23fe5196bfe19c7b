//! Module errors

use std::fmt;

/// Reasons a raw frame could not be turned into a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// Wrong number of fields, not an object, or missing `values` array.
    Malformed(String),

    /// A field that should hold a number does not.
    NotNumeric(String),

    /// A numeric field that cannot be represented as an axis value.
    OutOfRange(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Malformed(msg) => write!(f, "malformed frame: {}", msg),
            FrameError::NotNumeric(msg) => write!(f, "non numeric field: {}", msg),
            FrameError::OutOfRange(msg) => write!(f, "value out of range: {}", msg),
        }
    }
}

impl std::error::Error for FrameError {}

/// Represents the different types of errors that can occur while acquiring samples.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// No candidate device or endpoint was found.
    NoDeviceFound(String),

    /// A device was found but could not be opened.
    OpenFailed(String),

    /// A previously open transport stopped responding.
    LinkLost(String),

    /// A frame arrived but could not be parsed.
    Decode(FrameError),

    /// Anything the acquisition loop does not know how to recover from by reconnecting.
    Unexpected(String),
}

impl BridgeError {
    /// True for failures that count against the fault threshold.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, BridgeError::Unexpected(_))
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::NoDeviceFound(msg) => write!(f, "no device found: {}", msg),
            BridgeError::OpenFailed(msg) => write!(f, "open failed: {}", msg),
            BridgeError::LinkLost(msg) => write!(f, "link lost: {}", msg),
            BridgeError::Decode(e) => write!(f, "{}", e),
            BridgeError::Unexpected(msg) => write!(f, "unexpected failure: {}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<FrameError> for BridgeError {
    fn from(value: FrameError) -> Self {
        BridgeError::Decode(value)
    }
}

impl From<tokio::task::JoinError> for BridgeError {
    fn from(value: tokio::task::JoinError) -> Self {
        BridgeError::Unexpected(format!("background task failed: {}", value))
    }
}
