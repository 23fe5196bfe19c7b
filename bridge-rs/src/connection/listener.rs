use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use common::{ImuSample, ImuType};
use publisher::Broadcaster;

use crate::codec;
use crate::errors::BridgeError;
use crate::models::shutdown::Shutdown;
use crate::models::{BridgeSettings, TransportDescriptor};
use crate::ports::{DriverContext, PollOutcome, SourceDriver, Transport};

/// Creates a fresh transport for every listener run.
pub type TransportFactory = Arc<dyn Fn() -> Box<dyn Transport> + Send + Sync>;

struct ListenerTask {
    handle: JoinHandle<()>,
    stop: Shutdown,
    first_sample: watch::Receiver<bool>,
}

/// Source streamed by a background task that publishes every sample it reads.
///
/// The acquisition loop never reads frames itself. Each poll is a health check:
/// the first poll after `connect` starts the task, later polls report a dead
/// task as a lost link so the machine rediscovers the phone before a new task
/// is started. Polls report `Streaming` only once the task has published a
/// sample.
pub struct SupervisedListener {
    imu_type: ImuType,
    make_transport: TransportFactory,
    broadcaster: Arc<Broadcaster<ImuSample>>,
    shutdown: Shutdown,
    frame_timeout: Duration,
    descriptor: Option<TransportDescriptor>,
    task: Option<ListenerTask>,
}

impl SupervisedListener {
    pub fn new(
        imu_type: ImuType,
        make_transport: TransportFactory,
        context: &DriverContext,
        settings: &BridgeSettings,
    ) -> Self {
        Self {
            imu_type,
            make_transport,
            broadcaster: context.broadcaster.clone(),
            shutdown: context.shutdown.clone(),
            frame_timeout: settings.network_frame_timeout,
            descriptor: None,
            task: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }

    async fn reap(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop.trigger();
            if let Err(e) = task.handle.await {
                error!("Network listener failed: {}", e);
            }
        }
    }

    fn start(&mut self, descriptor: TransportDescriptor) {
        let stop = Shutdown::new();
        let (first_sample_tx, first_sample) = watch::channel(false);
        let handle = tokio::spawn(listen(
            (self.make_transport)(),
            descriptor,
            self.broadcaster.clone(),
            first_sample_tx,
            stop.clone(),
            self.shutdown.clone(),
            self.frame_timeout,
        ));
        self.task = Some(ListenerTask {
            handle,
            stop,
            first_sample,
        });
    }

    /// Waits up to one frame timeout for the running task to publish its first sample.
    async fn wait_first_sample(&mut self) -> PollOutcome {
        let frame_timeout = self.frame_timeout;
        let Some(task) = self.task.as_mut() else {
            return PollOutcome::Idle;
        };
        if *task.first_sample.borrow() {
            return PollOutcome::Streaming;
        }
        match tokio::time::timeout(frame_timeout, task.first_sample.wait_for(|seen| *seen)).await {
            Ok(Ok(_)) => PollOutcome::Streaming,
            _ => PollOutcome::Idle,
        }
    }
}

#[async_trait]
impl SourceDriver for SupervisedListener {
    /// Probes the endpoint with an open/close round trip.
    async fn connect(&mut self) -> Result<(), BridgeError> {
        let mut probe = (self.make_transport)();
        let descriptor = probe.discover().await?;
        probe.open(&descriptor).await?;
        probe.close().await;
        debug!("Probe of {} succeeded", descriptor);
        self.descriptor = Some(descriptor);
        Ok(())
    }

    async fn poll(&mut self) -> Result<PollOutcome, BridgeError> {
        let descriptor = self
            .descriptor
            .clone()
            .ok_or(BridgeError::LinkLost("listener was never connected".to_string()))?;

        if self.task.is_none() {
            debug!("Starting network listener on {}", descriptor);
            self.start(descriptor);
        } else if !self.is_alive() {
            self.reap().await;
            return Err(BridgeError::LinkLost(format!(
                "network listener on {} stopped",
                descriptor
            )));
        }
        Ok(self.wait_first_sample().await)
    }

    async fn close(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.stop.trigger();
            let grace = self.frame_timeout + Duration::from_secs(1);
            if tokio::time::timeout(grace, &mut task.handle).await.is_err() {
                warn!("Network listener did not stop in time, aborting it");
                task.handle.abort();
            }
        }
        self.descriptor = None;
    }

    fn imu_type(&self) -> ImuType {
        self.imu_type
    }
}

impl Drop for SupervisedListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop.trigger();
            task.handle.abort();
        }
    }
}

/// Reads frames until the link drops or either stop signal fires.
async fn listen(
    mut transport: Box<dyn Transport>,
    descriptor: TransportDescriptor,
    broadcaster: Arc<Broadcaster<ImuSample>>,
    first_sample: watch::Sender<bool>,
    stop: Shutdown,
    shutdown: Shutdown,
    frame_timeout: Duration,
) {
    if let Err(e) = transport.open(&descriptor).await {
        warn!("Network listener could not open {}: {}", descriptor, e);
        return;
    }
    let format = transport.frame_format();
    info!("Network listener started on {}", descriptor);

    loop {
        let read = tokio::select! {
            _ = stop.wait() => break,
            _ = shutdown.wait() => break,
            read = transport.read_frame(frame_timeout) => read,
        };
        match read {
            Ok(Some(raw)) => match codec::decode(format, &raw) {
                Ok(Some(sample)) => {
                    first_sample.send_if_modified(|seen| !std::mem::replace(seen, true));
                    broadcaster.publish(sample);
                }
                Ok(None) => {}
                Err(e) => warn!("Dropping message: {}", e),
            },
            Ok(None) => {}
            Err(e) => {
                warn!("Network listener stopped: {}", e);
                break;
            }
        }
    }

    transport.close().await;
    debug!("Network listener on {} exited", descriptor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockEvent, MockScript};
    use crate::codec::FrameFormat;

    fn listener(script: &MockScript, shutdown: &Shutdown) -> SupervisedListener {
        let context = DriverContext {
            broadcaster: Arc::new(Broadcaster::new()),
            shutdown: shutdown.clone(),
        };
        let settings = BridgeSettings {
            network_frame_timeout: Duration::from_millis(20),
            ..BridgeSettings::default()
        };
        let script = script.clone();
        SupervisedListener::new(
            ImuType::Phone,
            Arc::new(move || Box::new(script.transport()) as Box<dyn Transport>),
            &context,
            &settings,
        )
    }

    #[tokio::test]
    async fn test_listener_publishes_samples() {
        let script = MockScript::new(FrameFormat::Json);
        script.push_frame(r#"{"values":[12,34,56]}"#);
        let shutdown = Shutdown::new();
        let mut listener = listener(&script, &shutdown);
        let mut samples = listener.broadcaster.subscribe();

        listener.connect().await.unwrap();
        assert_eq!(script.close_calls(), 1);
        assert_eq!(listener.poll().await.unwrap(), PollOutcome::Streaming);

        let sample = tokio::time::timeout(Duration::from_secs(1), samples.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sample.axes(), [12, 34, 56, 0, 0, 0]);

        listener.close().await;
        assert!(!listener.is_alive());
    }

    #[tokio::test]
    async fn test_streaming_waits_for_first_sample() {
        let script = MockScript::new(FrameFormat::Json);
        let shutdown = Shutdown::new();
        let mut listener = listener(&script, &shutdown);

        listener.connect().await.unwrap();
        assert_eq!(listener.poll().await.unwrap(), PollOutcome::Idle);
        assert!(listener.is_alive());

        script.push_frame(r#"{"values":[1,2,3]}"#);
        assert_eq!(listener.poll().await.unwrap(), PollOutcome::Streaming);
        assert_eq!(listener.poll().await.unwrap(), PollOutcome::Streaming);

        listener.close().await;
    }

    #[tokio::test]
    async fn test_dead_listener_reports_link_loss() {
        let script = MockScript::new(FrameFormat::Json);
        script
            .push_frame(r#"{"values":[12,34,56]}"#)
            .push_event(MockEvent::LinkLost);
        let shutdown = Shutdown::new();
        let mut listener = listener(&script, &shutdown);

        listener.connect().await.unwrap();
        assert_eq!(listener.poll().await.unwrap(), PollOutcome::Streaming);
        let opens = script.open_calls();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!listener.is_alive());
        assert!(matches!(
            listener.poll().await,
            Err(BridgeError::LinkLost(_))
        ));
        assert_eq!(script.open_calls(), opens);

        listener.connect().await.unwrap();
        listener.poll().await.unwrap();
        assert!(script.open_calls() > opens);
        listener.close().await;
    }

    #[tokio::test]
    async fn test_listener_honours_shutdown() {
        let script = MockScript::new(FrameFormat::Json);
        let shutdown = Shutdown::new();
        let mut listener = listener(&script, &shutdown);

        listener.connect().await.unwrap();
        listener.poll().await.unwrap();
        assert!(listener.is_alive());

        shutdown.trigger();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!listener.is_alive());
    }

    #[tokio::test]
    async fn test_poll_before_connect_is_link_lost() {
        let script = MockScript::new(FrameFormat::Json);
        let shutdown = Shutdown::new();
        let mut listener = listener(&script, &shutdown);
        assert!(matches!(
            listener.poll().await,
            Err(BridgeError::LinkLost(_))
        ));
    }
}
