//! Acquisition state machine.
//!
//! ```text
//! Standby --connect ok--> Connected --update--> Ready --update--> Running
//!    ^  \--connect fails--/  |                    |                 |
//!    +--- reconnect fails ---+                    |                 |
//!    +------------------------- link lost --------+-----------------+
//! ```
//!
//! A lost link in `Connected` keeps the phase and the next step connects
//! again. Idle polls and undecodable frames never change the phase. `Exit` is
//! terminal.

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::watch;

use common::{AcquisitionPhase, ImuSample, ImuType};
use publisher::Broadcaster;

use crate::calibration::{CaptureStatus, StabilizationCapture};
use crate::connection::ConnectionManager;
use crate::errors::BridgeError;
use crate::models::SharedConfig;
use crate::ports::PollOutcome;

/// What a single step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A source was opened.
    Connected,
    /// No source could be opened, retry after a cooldown.
    ConnectFailed,
    /// A sample was read and published.
    Updated,
    /// A background listener is delivering samples.
    Streaming,
    /// Nothing new this cycle.
    NoUpdate,
    /// The source went away, back to discovery.
    LinkLost,
    /// The machine is in `Exit`.
    Stopped,
}

pub struct AcquisitionMachine {
    phase: watch::Sender<AcquisitionPhase>,
    connection: ConnectionManager,
    broadcaster: Arc<Broadcaster<ImuSample>>,
    config: Arc<SharedConfig>,
    capture: Arc<dyn StabilizationCapture>,
}

impl AcquisitionMachine {
    pub fn new(
        connection: ConnectionManager,
        broadcaster: Arc<Broadcaster<ImuSample>>,
        config: Arc<SharedConfig>,
        capture: Arc<dyn StabilizationCapture>,
    ) -> Self {
        let (phase, _) = watch::channel(AcquisitionPhase::Standby);
        Self {
            phase,
            connection,
            broadcaster,
            config,
            capture,
        }
    }

    pub fn phase(&self) -> AcquisitionPhase {
        *self.phase.borrow()
    }

    pub fn phase_receiver(&self) -> watch::Receiver<AcquisitionPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, next: AcquisitionPhase) {
        let previous = self.phase.send_replace(next);
        if previous != next {
            debug!("Phase {} -> {}", previous, next);
        }
    }

    /// Moves one step forward on a successful poll.
    fn advance(&self) {
        match self.phase() {
            AcquisitionPhase::Connected => self.set_phase(AcquisitionPhase::Ready),
            AcquisitionPhase::Ready => self.set_phase(AcquisitionPhase::Running),
            _ => {}
        }
    }

    /// Runs one connect or poll cycle depending on the current phase.
    ///
    /// Only `Unexpected` failures are returned as errors. Everything else is
    /// absorbed into a phase transition.
    pub async fn step(&mut self) -> Result<StepOutcome, BridgeError> {
        match self.phase() {
            AcquisitionPhase::Exit => Ok(StepOutcome::Stopped),
            AcquisitionPhase::Standby => match self.connection.connect().await {
                Ok(()) => {
                    self.set_phase(AcquisitionPhase::Connected);
                    Ok(StepOutcome::Connected)
                }
                Err(e) if e.is_unexpected() => Err(e),
                Err(e) => {
                    debug!("Connect attempt failed: {}", e);
                    Ok(StepOutcome::ConnectFailed)
                }
            },
            AcquisitionPhase::Connected if !self.connection.is_connected() => {
                match self.connection.connect().await {
                    Ok(()) => Ok(StepOutcome::Connected),
                    Err(e) if e.is_unexpected() => Err(e),
                    Err(e) => {
                        info!("Reconnect failed, back to discovery: {}", e);
                        self.set_phase(AcquisitionPhase::Standby);
                        Ok(StepOutcome::ConnectFailed)
                    }
                }
            }
            AcquisitionPhase::Connected | AcquisitionPhase::Ready | AcquisitionPhase::Running => {
                match self.connection.poll().await {
                    Ok(PollOutcome::Sample(sample)) => {
                        self.broadcaster.publish(sample);
                        self.calibrate(&sample);
                        self.advance();
                        Ok(StepOutcome::Updated)
                    }
                    Ok(PollOutcome::Streaming) => {
                        self.advance();
                        Ok(StepOutcome::Streaming)
                    }
                    Ok(PollOutcome::Idle) => Ok(StepOutcome::NoUpdate),
                    Err(BridgeError::Decode(e)) => {
                        warn!("Dropping frame: {}", e);
                        Ok(StepOutcome::NoUpdate)
                    }
                    Err(e) if e.is_unexpected() => Err(e),
                    Err(e) => {
                        self.connection.close().await;
                        if self.phase() == AcquisitionPhase::Connected {
                            info!("Poll failed before the first sample, retrying: {}", e);
                        } else {
                            info!("Link lost, back to discovery: {}", e);
                            self.set_phase(AcquisitionPhase::Standby);
                        }
                        Ok(StepOutcome::LinkLost)
                    }
                }
            }
        }
    }

    fn calibrate(&self, sample: &ImuSample) {
        if !self.config.is_calibrating() || self.connection.active_type() != Some(ImuType::Esp32) {
            return;
        }
        if self.capture.capture(sample) == CaptureStatus::Complete {
            info!("Stabilization offsets captured");
            self.config.set_calibrating(false);
        }
    }

    /// Drops the source and returns to `Standby`, unless already in `Exit`.
    pub async fn reset(&mut self) {
        self.connection.close().await;
        if !self.phase().is_terminal() {
            self.set_phase(AcquisitionPhase::Standby);
        }
    }

    /// Drops the source and enters `Exit` for good.
    pub async fn exit(&mut self) {
        self.connection.close().await;
        self.set_phase(AcquisitionPhase::Exit);
    }
}
