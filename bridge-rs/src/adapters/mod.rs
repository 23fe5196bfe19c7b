pub mod mock;
pub mod replay;
pub mod serial;
pub mod websocket;

pub use mock::{MockEvent, MockScript, MockTransport};
pub use replay::ReplayTransport;
pub use serial::SerialTransport;
pub use websocket::WebSocketTransport;
