use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use bridge_rs::models::shutdown::{listen_for_shutdown, Shutdown};
use bridge_rs::models::BridgeSettings;
use bridge_rs::services;
use bridge_rs::supervisor::{ExitReason, FaultResetPolicy};
use motionblob::config::{ConfigStore, DEFAULT_CONFIG_FILE};
use motionblob::server::{self, AppState, DEFAULT_BIND_ADDRESS};
use motionblob::{display, recorder};
use publisher::DisplayQueue;

/// Bridges an ESP32 or phone IMU to a text display and an HTTP status endpoint.
#[derive(Parser, Debug)]
#[command(name = "motionblob", version)]
struct Args {
    /// Configuration file with IMU_TYPE and PHONE_IP
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address of the HTTP status server
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
    bind: String,

    /// Serial baud rate of the ESP32
    #[arg(long, default_value_t = bridge_rs::constants::DEFAULT_BAUD_RATE)]
    baud_rate: u32,

    /// Pause after a failed connect attempt
    #[arg(long, default_value_t = bridge_rs::constants::CONNECT_COOLDOWN_MS)]
    connect_cooldown_ms: u64,

    /// Pause after an unexpected failure
    #[arg(long, default_value_t = bridge_rs::constants::RECOVERY_INTERVAL_SECS)]
    recovery_secs: u64,

    /// Unexpected failures tolerated before giving up
    #[arg(long, default_value_t = bridge_rs::constants::MAX_FAULTS)]
    max_faults: u32,

    /// Forget past failures after this many successful updates
    #[arg(long)]
    fault_reset_after: Option<u32>,

    /// Append every sample to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> BridgeSettings {
        BridgeSettings {
            baud_rate: self.baud_rate,
            connect_cooldown: Duration::from_millis(self.connect_cooldown_ms),
            recovery_interval: Duration::from_secs(self.recovery_secs),
            max_faults: self.max_faults,
            fault_reset_policy: match self.fault_reset_after {
                Some(n) => FaultResetPolicy::AfterSuccesses(n),
                None => FaultResetPolicy::Never,
            },
            ..BridgeSettings::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Arc::new(ConfigStore::new(&args.config));
    let source = match config.load().await {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };
    info!("Starting with {} source", source.imu_type);

    let listener = match tokio::net::TcpListener::bind(&args.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Cannot bind HTTP server to {}: {}", args.bind, e);
            return ExitCode::from(2);
        }
    };

    let shutdown = Shutdown::new();
    let signal_handle = listen_for_shutdown(shutdown.clone(), None);
    let (bridge_handle, bridge) = services::run_service(source, args.settings(), shutdown.clone());

    let (queue, receiver) = DisplayQueue::new(DisplayQueue::DEFAULT_CAPACITY);
    display::attach(bridge.broadcaster(), queue);
    let display_handle = display::spawn_display(
        receiver,
        std::io::stdout(),
        Duration::from_millis(display::REFRESH_PERIOD_MS),
        shutdown.clone(),
    );

    let recorder_handle = args.log_file.clone().map(|path| {
        recorder::spawn_recorder(path, bridge.subscribe(), shutdown.clone())
    });

    let server_handle = tokio::spawn(server::serve(
        listener,
        AppState {
            bridge: bridge.clone(),
            config,
        },
        shutdown.clone(),
    ));

    let reason = match bridge_handle.await {
        Ok(reason) => reason,
        Err(e) => {
            error!("Acquisition loop failed: {}", e);
            ExitReason::FaultLimit
        }
    };
    shutdown.trigger();

    if let Err(e) = display_handle.await {
        warn!("Display task failed: {}", e);
    }
    if let Some(handle) = recorder_handle {
        match handle.await {
            Ok(Err(e)) => warn!("Recorder stopped with error: {}", e),
            Err(e) => warn!("Recorder task failed: {}", e),
            Ok(Ok(_)) => {}
        }
    }
    match server_handle.await {
        Ok(Err(e)) => warn!("HTTP server stopped with error: {}", e),
        Err(e) => warn!("HTTP server task failed: {}", e),
        Ok(Ok(())) => {}
    }
    signal_handle.abort();

    match reason {
        ExitReason::Shutdown => {
            info!("Shut down cleanly");
            ExitCode::SUCCESS
        }
        ExitReason::FaultLimit => {
            error!("Giving up after repeated failures");
            ExitCode::FAILURE
        }
    }
}
