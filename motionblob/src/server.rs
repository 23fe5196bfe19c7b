//! HTTP status and command surface used by the settings front-end.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

use bridge_rs::models::shutdown::Shutdown;
use bridge_rs::services::BridgeService;
use common::AcquisitionPhase;

use crate::config::ConfigStore;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<BridgeService>,
    pub config: Arc<ConfigStore>,
}

/// Latest reading. Axis fields are `null` until the first sample arrives.
#[derive(Debug, Default, Serialize)]
pub struct ImuData {
    pub ax: Option<i32>,
    pub ay: Option<i32>,
    pub az: Option<i32>,
    pub gx: Option<i32>,
    pub gy: Option<i32>,
    pub gz: Option<i32>,
    pub timestamp: Option<f64>,
    pub status: AcquisitionPhase,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/imu_data", get(imu_data))
        .route("/status", get(status))
        .route("/refreshconfig", post(refresh_config))
        .route("/start_calibration", post(start_calibration))
        .route("/stop_calibration", post(stop_calibration))
        .with_state(state)
}

async fn imu_data(State(state): State<AppState>) -> Json<ImuData> {
    let status = state.bridge.phase();
    let data = match state.bridge.latest() {
        Some(sample) => {
            let [ax, ay, az, gx, gy, gz] = sample.axes();
            ImuData {
                ax: Some(ax),
                ay: Some(ay),
                az: Some(az),
                gx: Some(gx),
                gy: Some(gy),
                gz: Some(gz),
                timestamp: Some(sample.timestamp()),
                status,
            }
        }
        None => ImuData {
            status,
            ..ImuData::default()
        },
    };
    Json(data)
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": state.bridge.phase() }))
}

async fn refresh_config(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.config.load().await {
        Ok(source) => {
            state.bridge.refresh_source(source);
            Ok(Json(json!({ "status": "ok" })))
        }
        Err(e) => {
            error!("Config refresh failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

async fn start_calibration(State(state): State<AppState>) -> Json<Value> {
    state.bridge.start_calibration();
    Json(json!({ "calibrating": state.bridge.is_calibrating() }))
}

async fn stop_calibration(State(state): State<AppState>) -> Json<Value> {
    state.bridge.stop_calibration();
    Json(json!({ "calibrating": state.bridge.is_calibrating() }))
}

/// Serves the routes on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: Shutdown,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP status server listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
}
