/// Number of axes carried by one sample (3 accelerometer + 3 gyroscope).
pub const N_AXES: usize = 6;
/// Number of axes delivered by network sources (accelerometer only).
pub const N_ACCEL_AXES: usize = 3;
