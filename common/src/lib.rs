//! General functionality for the `motionblob` workspace
//!
//! Shared data model of the IMU bridge: the six-axis sample, the acquisition
//! phase, the configured source type and the listener callback traits used by
//! the `publisher` crate.

pub mod constants;

#[doc(hidden)]
pub mod traits;
#[doc(hidden)]
pub mod types;

// Re-export traits
#[doc(inline)]
pub use traits::Notifiable;

// Re-export types
#[doc(inline)]
pub use types::{AcquisitionPhase, Callback, Clock, ConnectionState, ImuSample, ImuType};
