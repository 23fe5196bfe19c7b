pub mod callback;
pub mod clock;
pub mod imu_type;
pub mod phase;
pub mod sample;

pub use callback::*;
pub use clock::*;
pub use imu_type::*;
pub use phase::*;
pub use sample::*;
