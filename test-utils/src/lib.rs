//! Helpers shared by the integration tests of the workspace.

pub mod csv_loader;
pub mod sinks;

pub use csv_loader::{load_frames, load_samples};
pub use sinks::SinkMock;
