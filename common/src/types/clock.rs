use std::time::{SystemTime, UNIX_EPOCH};

/// Wall clock reading in seconds since the UNIX epoch.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Clock(f64);

impl Clock {
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let timestamp = now.as_secs() as f64 + now.subsec_micros() as f64 * 1e-6;
        Self(timestamp)
    }

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }
}
