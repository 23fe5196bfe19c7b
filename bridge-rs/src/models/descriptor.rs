use std::fmt;
use std::path::PathBuf;

use crate::constants::DEVICE_FINGERPRINTS;

/// Identifies one concrete endpoint a transport can open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportDescriptor {
    Serial { path: String, baud_rate: u32 },
    Socket { url: String },
    File { path: PathBuf },
}

impl fmt::Display for TransportDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportDescriptor::Serial { path, baud_rate } => {
                write!(f, "{} @ {} baud", path, baud_rate)
            }
            TransportDescriptor::Socket { url } => f.write_str(url),
            TransportDescriptor::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Returns true if a port description looks like a USB/UART bridge that may host the IMU.
pub fn matches_known_device(description: &str) -> bool {
    let description = description.to_lowercase();
    DEVICE_FINGERPRINTS
        .iter()
        .any(|token| description.contains(token))
}

/// Picks the first description that matches a known device.
pub fn select_candidate<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    candidates
        .into_iter()
        .find(|(_, description)| matches_known_device(description))
        .map(|(path, _)| path)
}
