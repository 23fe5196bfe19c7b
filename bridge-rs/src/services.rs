use log::info;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use common::{AcquisitionPhase, ImuSample};
use publisher::{Broadcaster, Subscription};

use crate::adapters::MockScript;
use crate::calibration::{NoopCapture, StabilizationCapture};
use crate::connection::{default_factory, ConnectionManager};
use crate::machine::AcquisitionMachine;
use crate::models::shutdown::Shutdown;
use crate::models::{BridgeSettings, SharedConfig, SourceConfig};
use crate::ports::{DriverContext, SourceFactory};
use crate::supervisor::{supervise, ExitReason, FaultSupervisor};

/// Read side of a running bridge plus the few commands it accepts.
pub struct BridgeService {
    broadcaster: Arc<Broadcaster<ImuSample>>,
    phase: watch::Receiver<AcquisitionPhase>,
    config: Arc<SharedConfig>,
    shutdown: Shutdown,
}

impl BridgeService {
    pub fn broadcaster(&self) -> &Arc<Broadcaster<ImuSample>> {
        &self.broadcaster
    }

    /// Subscribes to samples published from now on.
    pub fn subscribe(&self) -> Subscription<ImuSample> {
        self.broadcaster.subscribe()
    }

    /// Most recent sample, if any was read yet.
    pub fn latest(&self) -> Option<ImuSample> {
        self.broadcaster.latest()
    }

    pub fn phase(&self) -> AcquisitionPhase {
        *self.phase.borrow()
    }

    pub fn phase_receiver(&self) -> watch::Receiver<AcquisitionPhase> {
        self.phase.clone()
    }

    pub fn source(&self) -> SourceConfig {
        self.config.source()
    }

    /// Swaps the source selection. A running bridge rediscovers on its next poll
    /// if the IMU type changed.
    pub fn refresh_source(&self, source: SourceConfig) {
        let previous = self.config.replace_source(source);
        info!(
            "Source configuration refreshed (was {})",
            previous.imu_type
        );
    }

    pub fn start_calibration(&self) {
        info!("Calibration requested");
        self.config.set_calibrating(true);
    }

    pub fn stop_calibration(&self) {
        info!("Calibration stopped");
        self.config.set_calibrating(false);
    }

    pub fn is_calibrating(&self) -> bool {
        self.config.is_calibrating()
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }
}

/// Starts the bridge with production transports and a no-op stabilization capture.
///
/// # Returns
///
/// Returns a tuple containing:
/// * A `tokio::task::JoinHandle<ExitReason>` for the acquisition loop.
/// * An `Arc<BridgeService>` to read samples and phase and to send commands.
pub fn run_service(
    source: SourceConfig,
    settings: BridgeSettings,
    shutdown: Shutdown,
) -> (JoinHandle<ExitReason>, Arc<BridgeService>) {
    let factory = default_factory(settings.clone());
    run_service_with(
        source,
        settings,
        Box::new(factory),
        Arc::new(NoopCapture),
        shutdown,
    )
}

/// Starts the bridge with a custom source factory and stabilization capture.
pub fn run_service_with(
    source: SourceConfig,
    settings: BridgeSettings,
    factory: Box<dyn SourceFactory>,
    capture: Arc<dyn StabilizationCapture>,
    shutdown: Shutdown,
) -> (JoinHandle<ExitReason>, Arc<BridgeService>) {
    let broadcaster = Arc::new(Broadcaster::new());
    let config = Arc::new(SharedConfig::new(source));
    let context = DriverContext {
        broadcaster: broadcaster.clone(),
        shutdown: shutdown.clone(),
    };
    let connection = ConnectionManager::new(config.clone(), factory, context);
    let mut machine = AcquisitionMachine::new(connection, broadcaster.clone(), config.clone(), capture);

    let service = Arc::new(BridgeService {
        broadcaster,
        phase: machine.phase_receiver(),
        config,
        shutdown: shutdown.clone(),
    });

    let handle = tokio::spawn(async move {
        let mut supervisor = FaultSupervisor::new(settings.max_faults, settings.fault_reset_policy);
        supervise(&mut machine, &mut supervisor, &settings, &shutdown).await
    });
    (handle, service)
}

/// Starts a bridge reading from a scripted mock source.
pub fn run_mock_service(
    source: SourceConfig,
    settings: BridgeSettings,
    script: &MockScript,
    shutdown: Shutdown,
) -> (JoinHandle<ExitReason>, Arc<BridgeService>) {
    let factory = script.factory(settings.clone());
    run_service_with(
        source,
        settings,
        Box::new(factory),
        Arc::new(NoopCapture),
        shutdown,
    )
}
