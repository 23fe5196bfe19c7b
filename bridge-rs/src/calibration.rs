//! Stabilization offset capture.
//!
//! While calibration is requested and the source is an ESP32, every sample the
//! acquisition loop reads is handed to a [`StabilizationCapture`]. The default
//! capture does nothing and never completes, so calibration runs until it is
//! stopped externally.

use common::ImuSample;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureStatus {
    /// Needs more samples.
    Pending,
    /// Offsets captured, calibration can be switched off.
    Complete,
}

pub trait StabilizationCapture: Send + Sync {
    fn capture(&self, sample: &ImuSample) -> CaptureStatus;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCapture;

impl StabilizationCapture for NoopCapture {
    fn capture(&self, _sample: &ImuSample) -> CaptureStatus {
        CaptureStatus::Pending
    }
}
