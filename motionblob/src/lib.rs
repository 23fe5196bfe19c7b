//! # Crate motionblob
//!
//! Host application around `bridge-rs`: reads the configuration file, runs the
//! acquisition bridge, shows the latest reading as text, optionally records
//! samples to a log file and serves the HTTP status surface the settings
//! front-end talks to.

pub mod config;
pub mod display;
pub mod recorder;
pub mod server;
