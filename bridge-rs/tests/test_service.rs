use bridge_rs::adapters::{MockEvent, MockScript};
use bridge_rs::codec::FrameFormat;
use bridge_rs::errors::BridgeError;
use bridge_rs::models::shutdown::Shutdown;
use bridge_rs::models::{BridgeSettings, SourceConfig};
use bridge_rs::services;
use bridge_rs::supervisor::ExitReason;
use common::{AcquisitionPhase, ImuType};
use futures::SinkExt;
use std::io::Write;
use std::time::Duration;
use test_utils::{load_frames, SinkMock};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

fn fast_settings() -> BridgeSettings {
    BridgeSettings {
        connect_cooldown: Duration::from_millis(5),
        poll_interval: Duration::from_millis(5),
        recovery_interval: Duration::from_millis(5),
        replay_period: Duration::from_millis(5),
        ..BridgeSettings::default()
    }
}

/// Serves `message` every few milliseconds to every client until it hangs up.
async fn spawn_phone(message: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                while ws.send(Message::Text(message.to_string())).await.is_ok() {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            });
        }
    });
    port
}

#[tokio::test]
async fn test_serial_scenario() {
    let script = MockScript::new(FrameFormat::TabSeparated);
    script
        .push_frame("100\t-200\t50\t0\t0\t0\n")
        .push_frame("\n")
        .push_frame("300\t-100\t60\t1\t1\t1\n");

    let shutdown = Shutdown::new();
    let (handle, bridge) = services::run_mock_service(
        SourceConfig::new(ImuType::Esp32, ""),
        fast_settings(),
        &script,
        shutdown.clone(),
    );
    let sink = SinkMock::new();
    sink.attach(bridge.broadcaster());

    let mut phases = bridge.phase_receiver();
    tokio::time::timeout(
        Duration::from_secs(2),
        phases.wait_for(|phase| *phase == AcquisitionPhase::Running),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(sink.wait_for(2, Duration::from_secs(1)).await);
    let axes: Vec<[i32; 6]> = sink.samples().iter().map(|s| s.axes()).collect();
    assert_eq!(axes.len(), 2);
    assert!(axes.contains(&[100, -200, 50, 0, 0, 0]));
    assert!(axes.contains(&[300, -100, 60, 1, 1, 1]));
    assert_eq!(
        bridge.latest().map(|s| s.axes()),
        Some([300, -100, 60, 1, 1, 1])
    );

    shutdown.trigger();
    assert_eq!(handle.await.unwrap(), ExitReason::Shutdown);
    assert_eq!(bridge.phase(), AcquisitionPhase::Exit);
}

#[tokio::test]
async fn test_network_scenario() {
    let port = spawn_phone(r#"{"values":[12,34,56]}"#).await;
    let mut source = SourceConfig::new(ImuType::Phone, "127.0.0.1");
    source.phone_port = port;

    let shutdown = Shutdown::new();
    let (handle, bridge) = services::run_service(source, fast_settings(), shutdown.clone());
    let mut samples = bridge.subscribe();

    let sample = tokio::time::timeout(Duration::from_secs(5), samples.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sample.accel(), [12, 34, 56]);
    assert_eq!(sample.gyro(), [0, 0, 0]);

    let mut phases = bridge.phase_receiver();
    tokio::time::timeout(
        Duration::from_secs(2),
        phases.wait_for(|phase| *phase == AcquisitionPhase::Running),
    )
    .await
    .unwrap()
    .unwrap();

    shutdown.trigger();
    assert_eq!(handle.await.unwrap(), ExitReason::Shutdown);
}

#[tokio::test]
async fn test_replay_recording() {
    let frames = load_frames("../test-utils/test_data/serial_frames.tsv").unwrap();
    let mut recording = tempfile::NamedTempFile::new().unwrap();
    writeln!(recording, "START 1700000000.0").unwrap();
    for frame in &frames {
        writeln!(recording, "{}", frame).unwrap();
    }

    let mut source = SourceConfig::new(ImuType::Replay, "");
    source.replay_file = Some(recording.path().to_path_buf());

    let shutdown = Shutdown::new();
    let (handle, bridge) = services::run_service(source, fast_settings(), shutdown.clone());
    let sink = SinkMock::new();
    sink.attach(bridge.broadcaster());

    assert!(sink.wait_for(frames.len(), Duration::from_secs(5)).await);
    let axes: Vec<[i32; 6]> = sink.samples().iter().map(|s| s.axes()).collect();
    assert!(axes.contains(&[100, -200, 50, 0, 0, 0]));
    assert!(axes.contains(&[-5, 0, 16384, 12, -7, 3]));

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_fault_limit_stops_bridge() {
    let script = MockScript::new(FrameFormat::TabSeparated);
    script.push_frame("1\t2\t3\t4\t5\t6");
    for n in 0..6 {
        script.push_event(MockEvent::Unexpected(format!("fault {}", n)));
    }

    let shutdown = Shutdown::new();
    let (handle, bridge) = services::run_mock_service(
        SourceConfig::new(ImuType::Esp32, ""),
        fast_settings(),
        &script,
        shutdown.clone(),
    );

    let reason = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reason, ExitReason::FaultLimit);
    assert!(shutdown.is_triggered());
    assert_eq!(bridge.phase(), AcquisitionPhase::Exit);
}

#[tokio::test]
async fn test_no_device_keeps_retrying() {
    let script = MockScript::new(FrameFormat::TabSeparated);
    for _ in 0..10 {
        script.push_connect_result(Err(BridgeError::NoDeviceFound("none".into())));
    }

    let shutdown = Shutdown::new();
    let (handle, bridge) = services::run_mock_service(
        SourceConfig::new(ImuType::Esp32, ""),
        fast_settings(),
        &script,
        shutdown.clone(),
    );

    let mut phases = bridge.phase_receiver();
    tokio::time::timeout(
        Duration::from_secs(2),
        phases.wait_for(|phase| *phase == AcquisitionPhase::Connected),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(script.discover_calls(), 11);

    shutdown.trigger();
    assert_eq!(handle.await.unwrap(), ExitReason::Shutdown);
}

#[tokio::test]
async fn test_refresh_switches_source() {
    let script = MockScript::new(FrameFormat::TabSeparated);
    script.push_frame("1\t2\t3\t4\t5\t6");

    let shutdown = Shutdown::new();
    let (handle, bridge) = services::run_mock_service(
        SourceConfig::new(ImuType::Esp32, ""),
        fast_settings(),
        &script,
        shutdown.clone(),
    );

    let mut phases = bridge.phase_receiver();
    tokio::time::timeout(
        Duration::from_secs(2),
        phases.wait_for(|phase| *phase == AcquisitionPhase::Ready),
    )
    .await
    .unwrap()
    .unwrap();

    bridge.refresh_source(SourceConfig::new(ImuType::Replay, ""));
    tokio::time::timeout(Duration::from_secs(2), async {
        while script.discover_calls() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(bridge.source().imu_type, ImuType::Replay);

    shutdown.trigger();
    handle.await.unwrap();
}
