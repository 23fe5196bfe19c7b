// Replays a recorded sample log as if it were a serial device.
//
// Accepts plain tab separated frames and the recorder's own line format
// `Accel(x,y,z): (ax, ay, az)  Gyro(x,y,z): (gx, gy, gz), Time: t`.
// Session markers (`START ...`), logged errors (`ERROR: ...`) and blank lines
// are skipped.

use async_trait::async_trait;
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

use crate::codec::FrameFormat;
use crate::constants::REPLAY_LOOP_PAUSE_MS;
use crate::errors::BridgeError;
use crate::models::TransportDescriptor;
use crate::ports::Transport;

const SESSION_MARKER: &str = "START";
const ERROR_MARKER: &str = "ERROR:";

pub struct ReplayTransport {
    path: Option<PathBuf>,
    period: Duration,
    frames: Vec<String>,
    cursor: usize,
    next_due: Option<Instant>,
    open: bool,
}

impl ReplayTransport {
    pub fn new(path: Option<PathBuf>, period: Duration) -> Self {
        Self {
            path,
            period,
            frames: Vec::new(),
            cursor: 0,
            next_due: None,
            open: false,
        }
    }
}

/// Turns one recorded line into a tab separated frame. `None` for lines carrying no sample.
pub fn normalize_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(SESSION_MARKER) || line.starts_with(ERROR_MARKER) {
        return None;
    }
    if !line.starts_with("Accel") {
        return Some(line.to_string());
    }

    let body = line.split(", Time:").next().unwrap_or(line);
    let axes: Vec<&str> = body
        .split(|c: char| c == '(' || c == ')')
        .skip(1)
        .step_by(2)
        .filter(|group| !group.contains("x,y,z"))
        .flat_map(|group| group.split(','))
        .map(str::trim)
        .collect();
    Some(axes.join("\t"))
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn discover(&mut self) -> Result<TransportDescriptor, BridgeError> {
        match &self.path {
            Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => {
                Ok(TransportDescriptor::File { path: path.clone() })
            }
            Some(path) => Err(BridgeError::NoDeviceFound(format!(
                "replay file {} not found",
                path.display()
            ))),
            None => Err(BridgeError::NoDeviceFound(
                "no replay file configured".to_string(),
            )),
        }
    }

    async fn open(&mut self, descriptor: &TransportDescriptor) -> Result<(), BridgeError> {
        let path = match descriptor {
            TransportDescriptor::File { path } => path,
            other => {
                return Err(BridgeError::OpenFailed(format!(
                    "not a replay file: {}",
                    other
                )))
            }
        };

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BridgeError::OpenFailed(format!("{}: {}", path.display(), e)))?;
        self.frames = contents.lines().filter_map(normalize_line).collect();
        if self.frames.is_empty() {
            return Err(BridgeError::OpenFailed(format!(
                "{} holds no samples",
                path.display()
            )));
        }

        info!(
            "Replaying {} frames from {}",
            self.frames.len(),
            path.display()
        );
        self.cursor = 0;
        self.next_due = None;
        self.open = true;
        Ok(())
    }

    async fn read_frame(&mut self, timeout: Duration) -> Result<Option<String>, BridgeError> {
        if !self.open {
            return Err(BridgeError::LinkLost("replay file is not open".to_string()));
        }

        if self.cursor >= self.frames.len() {
            debug!("End of replay file, starting over");
            self.cursor = 0;
            self.next_due = Some(Instant::now() + Duration::from_millis(REPLAY_LOOP_PAUSE_MS));
        }

        let now = Instant::now();
        if let Some(due) = self.next_due {
            if due > now {
                if due - now > timeout {
                    tokio::time::sleep(timeout).await;
                    return Ok(None);
                }
                tokio::time::sleep_until(due).await;
            }
        }

        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        self.next_due = Some(Instant::now() + self.period);
        Ok(Some(frame))
    }

    async fn close(&mut self) {
        self.open = false;
        self.frames.clear();
        self.cursor = 0;
        self.next_due = None;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn frame_format(&self) -> FrameFormat {
        FrameFormat::TabSeparated
    }
}
