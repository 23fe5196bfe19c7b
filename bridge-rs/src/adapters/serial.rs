// Serial transport for ESP32 style devices writing tab separated frames.
//
// Port I/O is blocking, every call runs on the blocking pool and the port is
// moved there and back so the async side never holds it across an await.

use async_trait::async_trait;
use log::{debug, info, warn};
use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::{self, Read};
use std::time::{Duration, Instant};

use crate::codec::FrameFormat;
use crate::errors::BridgeError;
use crate::models::descriptor::select_candidate;
use crate::models::TransportDescriptor;
use crate::ports::Transport;

const READ_CHUNK: usize = 256;
/// Longest partial line kept while waiting for a line break.
const MAX_LINE_BYTES: usize = 1024;

pub struct SerialTransport {
    baud_rate: u32,
    read_timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
    pending: Vec<u8>,
}

impl SerialTransport {
    pub fn new(baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            baud_rate,
            read_timeout,
            port: None,
            pending: Vec::new(),
        }
    }
}

/// Human readable description used to match known devices.
fn describe(info: &SerialPortInfo) -> String {
    match &info.port_type {
        SerialPortType::UsbPort(usb) => format!(
            "{} {} {}",
            usb.product.as_deref().unwrap_or_default(),
            usb.manufacturer.as_deref().unwrap_or_default(),
            info.port_name
        ),
        SerialPortType::PciPort => format!("PCI {}", info.port_name),
        SerialPortType::BluetoothPort => format!("Bluetooth {}", info.port_name),
        SerialPortType::Unknown => info.port_name.clone(),
    }
}

/// Reads until a full line is buffered or `timeout` expires.
///
/// Bytes after the newline stay in `pending` for the next call. A partial line
/// longer than `MAX_LINE_BYTES` is discarded.
fn read_line<R: Read + ?Sized>(
    port: &mut R,
    pending: &mut Vec<u8>,
    timeout: Duration,
) -> io::Result<Option<String>> {
    let deadline = Instant::now() + timeout;
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        if let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
        }
        if pending.len() > MAX_LINE_BYTES {
            warn!("Discarding {} bytes received without a line break", pending.len());
            pending.clear();
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        match port.read(&mut chunk) {
            Ok(0) => return Ok(None),
            Ok(n) => pending.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn discover(&mut self) -> Result<TransportDescriptor, BridgeError> {
        let ports = tokio::task::spawn_blocking(serialport::available_ports)
            .await?
            .map_err(|e| BridgeError::NoDeviceFound(format!("cannot enumerate ports: {}", e)))?;

        let described: Vec<(String, String)> = ports
            .iter()
            .map(|info| (info.port_name.clone(), describe(info)))
            .collect();
        for (path, description) in &described {
            debug!("Serial candidate {}: {}", path, description);
        }

        select_candidate(
            described
                .iter()
                .map(|(path, description)| (path.as_str(), description.as_str())),
        )
        .map(|path| TransportDescriptor::Serial {
            path: path.to_string(),
            baud_rate: self.baud_rate,
        })
        .ok_or(BridgeError::NoDeviceFound(
            "No ESP32 serial port found".to_string(),
        ))
    }

    async fn open(&mut self, descriptor: &TransportDescriptor) -> Result<(), BridgeError> {
        let (path, baud_rate) = match descriptor {
            TransportDescriptor::Serial { path, baud_rate } => (path.clone(), *baud_rate),
            other => {
                return Err(BridgeError::OpenFailed(format!(
                    "not a serial port: {}",
                    other
                )))
            }
        };

        let read_timeout = self.read_timeout;
        let target = path.clone();
        let port = tokio::task::spawn_blocking(move || {
            serialport::new(target, baud_rate)
                .timeout(read_timeout)
                .open()
        })
        .await?
        .map_err(|e| {
            BridgeError::OpenFailed(format!("Could not open serial port {}: {}", path, e))
        })?;

        info!("Connected to ESP32 on {}", path);
        self.pending.clear();
        self.port = Some(port);
        Ok(())
    }

    async fn read_frame(&mut self, timeout: Duration) -> Result<Option<String>, BridgeError> {
        let mut port = self
            .port
            .take()
            .ok_or(BridgeError::LinkLost("serial port is not open".to_string()))?;
        let mut pending = std::mem::take(&mut self.pending);

        let (port, pending, result) = tokio::task::spawn_blocking(move || {
            let result = read_line(port.as_mut(), &mut pending, timeout);
            (port, pending, result)
        })
        .await?;

        match result {
            Ok(line) => {
                self.port = Some(port);
                self.pending = pending;
                Ok(line)
            }
            Err(e) => {
                warn!("Serial communication error: {}", e);
                drop(port);
                Err(BridgeError::LinkLost(e.to_string()))
            }
        }
    }

    async fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Serial port closed");
        }
        self.pending.clear();
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn frame_format(&self) -> FrameFormat {
        FrameFormat::TabSeparated
    }
}
