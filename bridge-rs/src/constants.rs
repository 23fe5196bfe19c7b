//! Default timings and limits of the bridge.

/// Baud rate the ESP32 firmware writes at.
pub const DEFAULT_BAUD_RATE: u32 = 38400;
/// Upper bound of a single serial read.
pub const SERIAL_READ_TIMEOUT_MS: u64 = 100;
/// Pause after a failed connect before the next discovery attempt.
pub const CONNECT_COOLDOWN_MS: u64 = 500;
/// Pause between polls that produced no new sample.
pub const POLL_INTERVAL_MS: u64 = 50;
/// Pause after an unexpected failure before the loop resumes.
pub const RECOVERY_INTERVAL_SECS: u64 = 20;
/// Unexpected failures tolerated before the bridge gives up.
pub const MAX_FAULTS: u32 = 5;

pub const DEFAULT_PHONE_PORT: u16 = 8080;
pub const DEFAULT_SENSOR_CHANNEL: &str = "android.sensor.accelerometer";
/// Time allowed for a WebSocket handshake.
pub const CONNECT_TIMEOUT_SECS: u64 = 5;
/// Upper bound of a single WebSocket receive inside the listener loop.
pub const NETWORK_FRAME_TIMEOUT_MS: u64 = 1000;

/// Pace of replayed frames.
pub const REPLAY_PERIOD_MS: u64 = 20;
/// Pause at the end of a replayed file before it starts over.
pub const REPLAY_LOOP_PAUSE_MS: u64 = 1000;

/// Case-insensitive tokens identifying a serial port that may host the IMU.
pub const DEVICE_FINGERPRINTS: [&str; 5] = ["usb", "uart", "serial", "cp210x", "ch340"];
