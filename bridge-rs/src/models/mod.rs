pub mod descriptor;
pub mod settings;
pub mod shutdown;

pub use descriptor::TransportDescriptor;
pub use settings::{BridgeSettings, SharedConfig, SourceConfig};
