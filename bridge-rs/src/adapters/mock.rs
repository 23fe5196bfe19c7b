// Scripted transport for tests and dry runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use common::ImuType;

use crate::codec::FrameFormat;
use crate::connection::{DirectLink, SupervisedListener};
use crate::errors::BridgeError;
use crate::models::{BridgeSettings, TransportDescriptor};
use crate::ports::{source_factory, SourceDriver, SourceFactory, Transport};

const IDLE_PAUSE: Duration = Duration::from_millis(5);

/// One scripted read result.
#[derive(Clone, Debug, PartialEq)]
pub enum MockEvent {
    Frame(String),
    Idle,
    LinkLost,
    Unexpected(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    connect_results: VecDeque<Result<(), BridgeError>>,
    events: VecDeque<MockEvent>,
    discover_calls: usize,
    open_calls: usize,
    close_calls: usize,
}

/// Shared script driving every [`MockTransport`] built from it.
///
/// Connect attempts consume `connect_results` in order and succeed once it is
/// empty. Reads consume `events` and report an idle link once it is empty.
#[derive(Clone, Debug)]
pub struct MockScript {
    state: Arc<Mutex<ScriptState>>,
    format: FrameFormat,
}

impl MockScript {
    pub fn new(format: FrameFormat) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState::default())),
            format,
        }
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_connect_result(&self, result: Result<(), BridgeError>) -> &Self {
        self.state().connect_results.push_back(result);
        self
    }

    pub fn push_event(&self, event: MockEvent) -> &Self {
        self.state().events.push_back(event);
        self
    }

    pub fn push_frame(&self, frame: &str) -> &Self {
        self.push_event(MockEvent::Frame(frame.to_string()))
    }

    pub fn pending_events(&self) -> usize {
        self.state().events.len()
    }

    pub fn discover_calls(&self) -> usize {
        self.state().discover_calls
    }

    pub fn open_calls(&self) -> usize {
        self.state().open_calls
    }

    pub fn close_calls(&self) -> usize {
        self.state().close_calls
    }

    pub fn transport(&self) -> MockTransport {
        MockTransport {
            script: self.clone(),
            open: false,
        }
    }

    /// Source factory serving every source type from this script.
    ///
    /// Phones get a supervised listener, everything else a direct link, the
    /// same split the production factory makes.
    pub fn factory(&self, settings: BridgeSettings) -> impl SourceFactory {
        let script = self.clone();
        source_factory(move |source, context| {
            let driver: Box<dyn SourceDriver> = match source.imu_type {
                ImuType::Phone => {
                    let script = script.clone();
                    Box::new(SupervisedListener::new(
                        ImuType::Phone,
                        Arc::new(move || Box::new(script.transport()) as Box<dyn Transport>),
                        context,
                        &settings,
                    ))
                }
                imu_type => Box::new(DirectLink::new(
                    script.transport(),
                    imu_type,
                    settings.serial_read_timeout,
                )),
            };
            Ok(driver)
        })
    }
}

pub struct MockTransport {
    script: MockScript,
    open: bool,
}

#[async_trait]
impl Transport for MockTransport {
    async fn discover(&mut self) -> Result<TransportDescriptor, BridgeError> {
        let next = {
            let mut state = self.script.state();
            state.discover_calls += 1;
            state.connect_results.pop_front()
        };
        match next {
            Some(Err(e)) => Err(e),
            _ => Ok(TransportDescriptor::Socket {
                url: "mock://imu".to_string(),
            }),
        }
    }

    async fn open(&mut self, _descriptor: &TransportDescriptor) -> Result<(), BridgeError> {
        self.script.state().open_calls += 1;
        self.open = true;
        Ok(())
    }

    async fn read_frame(&mut self, timeout: Duration) -> Result<Option<String>, BridgeError> {
        if !self.open {
            return Err(BridgeError::LinkLost("mock transport is not open".to_string()));
        }
        let event = self.script.state().events.pop_front();
        match event {
            Some(MockEvent::Frame(frame)) => Ok(Some(frame)),
            Some(MockEvent::LinkLost) => {
                self.open = false;
                Err(BridgeError::LinkLost("scripted link loss".to_string()))
            }
            Some(MockEvent::Unexpected(msg)) => Err(BridgeError::Unexpected(msg)),
            Some(MockEvent::Idle) | None => {
                tokio::time::sleep(timeout.min(IDLE_PAUSE)).await;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) {
        if self.open {
            self.script.state().close_calls += 1;
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn frame_format(&self) -> FrameFormat {
        self.script.format
    }
}
