//! Fault supervision of the acquisition loop.
//!
//! Expected failures (no device, lost link, bad frames) are handled inside the
//! state machine and never reach this module. Unexpected failures are counted.
//! Each one resets the machine and pauses the loop for a recovery interval.
//! Once the count exceeds the configured limit the bridge gives up, enters
//! `Exit` and raises the shutdown signal.

use log::{error, info, warn};

use crate::errors::BridgeError;
use crate::machine::{AcquisitionMachine, StepOutcome};
use crate::models::shutdown::Shutdown;
use crate::models::BridgeSettings;

/// When the fault count goes back to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultResetPolicy {
    /// Faults accumulate for the lifetime of the bridge.
    Never,
    /// Reset after this many consecutive successful updates.
    AfterSuccesses(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultVerdict {
    Recover,
    Trip,
}

/// Why the acquisition loop returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    Shutdown,
    FaultLimit,
}

#[derive(Debug)]
pub struct FaultSupervisor {
    max_faults: u32,
    policy: FaultResetPolicy,
    faults: u32,
    successes: u32,
}

impl FaultSupervisor {
    pub fn new(max_faults: u32, policy: FaultResetPolicy) -> Self {
        Self {
            max_faults,
            policy,
            faults: 0,
            successes: 0,
        }
    }

    pub fn record_fault(&mut self, fault: &BridgeError) -> FaultVerdict {
        self.faults += 1;
        self.successes = 0;
        error!(
            "Unexpected failure {}/{}: {}",
            self.faults, self.max_faults, fault
        );
        if self.faults > self.max_faults {
            FaultVerdict::Trip
        } else {
            FaultVerdict::Recover
        }
    }

    pub fn record_success(&mut self) {
        if let FaultResetPolicy::AfterSuccesses(required) = self.policy {
            if self.faults == 0 {
                return;
            }
            self.successes += 1;
            if self.successes >= required {
                info!("Fault count reset after {} successful updates", required);
                self.faults = 0;
                self.successes = 0;
            }
        }
    }

    pub fn fault_count(&self) -> u32 {
        self.faults
    }
}

/// Drives `machine` until shutdown or until the fault limit trips.
pub async fn supervise(
    machine: &mut AcquisitionMachine,
    supervisor: &mut FaultSupervisor,
    settings: &BridgeSettings,
    shutdown: &Shutdown,
) -> ExitReason {
    loop {
        if shutdown.is_triggered() {
            break;
        }

        let result = tokio::select! {
            _ = shutdown.wait() => break,
            result = machine.step() => result,
        };

        match result {
            Ok(StepOutcome::Stopped) => break,
            Ok(StepOutcome::Connected) => {}
            Ok(StepOutcome::Updated) => supervisor.record_success(),
            Ok(StepOutcome::Streaming) => {
                supervisor.record_success();
                shutdown.sleep(settings.poll_interval).await;
            }
            Ok(StepOutcome::NoUpdate) => {}
            Ok(StepOutcome::LinkLost) => {
                shutdown.sleep(settings.poll_interval).await;
            }
            Ok(StepOutcome::ConnectFailed) => {
                shutdown.sleep(settings.connect_cooldown).await;
            }
            Err(fault) => match supervisor.record_fault(&fault) {
                FaultVerdict::Trip => {
                    error!(
                        "Too many unexpected failures ({}), stopping",
                        supervisor.fault_count()
                    );
                    machine.exit().await;
                    shutdown.trigger();
                    return ExitReason::FaultLimit;
                }
                FaultVerdict::Recover => {
                    machine.reset().await;
                    warn!(
                        "Resuming acquisition in {:?}",
                        settings.recovery_interval
                    );
                    shutdown.sleep(settings.recovery_interval).await;
                }
            },
        }
    }

    info!("Shutdown requested, stopping acquisition");
    machine.exit().await;
    ExitReason::Shutdown
}
