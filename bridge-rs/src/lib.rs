//! # Crate bridge-rs
//!
//! ## bridge-rs
//!
//! The `bridge-rs` crate connects to a motion sensing peripheral and keeps a
//! continuously refreshed six-axis reading available to any number of consumers.
//! Two kinds of peripheral are supported:
//!
//! - An ESP32 (or any microcontroller) writing tab separated frames
//!   `ax\tay\taz\tgx\tgy\tgz\n` to a serial port.
//! - A phone streaming accelerometer messages `{"values":[x,y,z]}` over a WebSocket.
//!   Phones deliver no gyroscope data, those axes are always zero.
//!
//! A recorded log file can also be replayed as if it were a serial device.
//!
//! The acquisition loop walks through `Standby -> Connected -> Ready -> Running`,
//! falls back to `Standby` whenever the link is lost, and stops in `Exit` on shutdown
//! or after too many unexpected failures. The latest sample is published through a
//! [`publisher::Broadcaster`] and the current phase through a `tokio::sync::watch` channel.
//!
//! ```no_run
//! use bridge_rs::models::{BridgeSettings, SourceConfig};
//! use bridge_rs::models::shutdown::Shutdown;
//! use bridge_rs::services;
//! use common::ImuType;
//!
//! # async fn run() {
//! let source = SourceConfig::new(ImuType::Esp32, "192.168.1.20");
//! let shutdown = Shutdown::new();
//! let (handle, bridge) = services::run_service(source, BridgeSettings::default(), shutdown.clone());
//!
//! let mut samples = bridge.subscribe();
//! if let Some(sample) = samples.next().await {
//!     println!("{}", sample);
//! }
//! shutdown.trigger();
//! let _reason = handle.await;
//! # }
//! ```

pub mod adapters;
pub mod calibration;
pub mod codec;
pub mod connection;
pub mod constants;
pub mod errors;
pub mod machine;
pub mod models;
pub mod ports;
pub mod services;
pub mod supervisor;
