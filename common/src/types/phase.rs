use serde::{Deserialize, Serialize};
use std::fmt;

/// Outward lifecycle of the acquisition loop.
///
/// `Standby -> Connected -> Ready -> Running`, collapsing back to `Standby`
/// whenever the link is lost. `Exit` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AcquisitionPhase {
    #[default]
    Standby,
    Connected,
    Ready,
    Running,
    Exit,
}

impl AcquisitionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AcquisitionPhase::Exit)
    }

    /// Connection state implied by the phase.
    pub fn connection_state(&self) -> ConnectionState {
        match self {
            AcquisitionPhase::Standby | AcquisitionPhase::Exit => ConnectionState::Idle,
            AcquisitionPhase::Connected => ConnectionState::Connected,
            AcquisitionPhase::Ready | AcquisitionPhase::Running => ConnectionState::DataFlowing,
        }
    }
}

impl fmt::Display for AcquisitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcquisitionPhase::Standby => "STANDBY",
            AcquisitionPhase::Connected => "CONNECTED",
            AcquisitionPhase::Ready => "READY",
            AcquisitionPhase::Running => "RUNNING",
            AcquisitionPhase::Exit => "EXIT",
        };
        f.write_str(name)
    }
}

/// State of the underlying transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    /// No open transport.
    #[default]
    Idle,
    /// Transport open, no valid frame seen yet.
    Connected,
    /// At least one valid frame parsed, samples are being published.
    DataFlowing,
}
