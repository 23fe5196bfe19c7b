use serde::Serialize;
use std::fmt;

use crate::constants::N_AXES;
use crate::types::Clock;

/// Raw six-axis reading from an IMU.
///
/// Axis values are passed through exactly as the device reported them; no
/// scaling or filtering is applied. The timestamp records when the sample was
/// captured by the bridge, not when the device measured it.
///
/// # Examples
///
/// ```
/// use common::ImuSample;
///
/// let sample = ImuSample::new([100, -200, 50], [0, 1, 2]);
/// assert_eq!(sample.accel(), [100, -200, 50]);
/// assert_eq!(sample.gyro(), [0, 1, 2]);
/// assert_eq!(sample.axes(), [100, -200, 50, 0, 1, 2]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ImuSample {
    ax: i32,
    ay: i32,
    az: i32,
    gx: i32,
    gy: i32,
    gz: i32,
    timestamp: f64,
}

impl ImuSample {
    /// Creates a sample stamped with the current wall clock.
    pub fn new(accel: [i32; 3], gyro: [i32; 3]) -> Self {
        Self::with_timestamp(accel, gyro, Clock::now())
    }

    pub fn with_timestamp(accel: [i32; 3], gyro: [i32; 3], captured_at: Clock) -> Self {
        Self {
            ax: accel[0],
            ay: accel[1],
            az: accel[2],
            gx: gyro[0],
            gy: gyro[1],
            gz: gyro[2],
            timestamp: captured_at.as_secs(),
        }
    }

    /// Creates an accelerometer-only sample. Gyroscope axes are zero.
    pub fn from_accel(accel: [i32; 3]) -> Self {
        Self::new(accel, [0; 3])
    }

    pub fn accel(&self) -> [i32; 3] {
        [self.ax, self.ay, self.az]
    }

    pub fn gyro(&self) -> [i32; 3] {
        [self.gx, self.gy, self.gz]
    }

    /// Returns `[ax, ay, az, gx, gy, gz]`.
    pub fn axes(&self) -> [i32; N_AXES] {
        [self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl TryFrom<&[i32]> for ImuSample {
    type Error = &'static str;

    fn try_from(value: &[i32]) -> Result<Self, Self::Error> {
        if value.len() != N_AXES {
            return Err("Invalid number of axes");
        }
        Ok(ImuSample::new(
            [value[0], value[1], value[2]],
            [value[3], value[4], value[5]],
        ))
    }
}

impl fmt::Display for ImuSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Accel(x,y,z): ({}, {}, {})  Gyro(x,y,z): ({}, {}, {})",
            self.ax, self.ay, self.az, self.gx, self.gy, self.gz
        )
    }
}
