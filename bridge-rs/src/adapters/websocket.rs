// WebSocket transport for phones streaming accelerometer messages.

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::codec::FrameFormat;
use crate::constants::CONNECT_TIMEOUT_SECS;
use crate::errors::BridgeError;
use crate::models::TransportDescriptor;
use crate::ports::Transport;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WebSocketTransport {
    url: String,
    stream: Option<WsStream>,
}

impl WebSocketTransport {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            stream: None,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    /// There is exactly one configured endpoint, nothing to enumerate.
    async fn discover(&mut self) -> Result<TransportDescriptor, BridgeError> {
        if self.url.is_empty() {
            return Err(BridgeError::NoDeviceFound(
                "no phone endpoint configured".to_string(),
            ));
        }
        Ok(TransportDescriptor::Socket {
            url: self.url.clone(),
        })
    }

    async fn open(&mut self, descriptor: &TransportDescriptor) -> Result<(), BridgeError> {
        let url = match descriptor {
            TransportDescriptor::Socket { url } => url.as_str(),
            other => {
                return Err(BridgeError::OpenFailed(format!(
                    "not a socket endpoint: {}",
                    other
                )))
            }
        };

        let connect = connect_async(url);
        let (stream, _response) =
            tokio::time::timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), connect)
                .await
                .map_err(|_| BridgeError::OpenFailed(format!("timed out connecting to {}", url)))?
                .map_err(|e| BridgeError::OpenFailed(format!("{}: {}", url, e)))?;

        info!("Connected to phone sensor stream {}", url);
        self.stream = Some(stream);
        Ok(())
    }

    async fn read_frame(&mut self, timeout: Duration) -> Result<Option<String>, BridgeError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(BridgeError::LinkLost("socket is not open".to_string()))?;

        let message = match tokio::time::timeout(timeout, stream.next()).await {
            Err(_) => return Ok(None),
            Ok(message) => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => Ok(Some(text)),
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => Ok(Some(text)),
                Err(e) => {
                    warn!("Dropping non UTF-8 binary message: {}", e);
                    Ok(None)
                }
            },
            Some(Ok(Message::Close(frame))) => {
                debug!("Phone closed the stream: {:?}", frame);
                self.stream = None;
                Err(BridgeError::LinkLost("connection closed by phone".to_string()))
            }
            Some(Ok(_)) => Ok(None),
            Some(Err(e)) => {
                self.stream = None;
                Err(BridgeError::LinkLost(e.to_string()))
            }
            None => {
                self.stream = None;
                Err(BridgeError::LinkLost("stream ended".to_string()))
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                debug!("Error closing phone stream: {}", e);
            }
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn frame_format(&self) -> FrameFormat {
        FrameFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;
    use tokio::net::TcpListener;

    async fn serve_messages(messages: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            for message in messages {
                ws.send(Message::Text(message.to_string())).await.unwrap();
            }
            ws.close(None).await.unwrap();
        });
        format!("ws://{}/sensor/connect?type=android.sensor.accelerometer", addr)
    }

    #[tokio::test]
    async fn test_discover_returns_configured_endpoint() {
        let mut transport = WebSocketTransport::new("ws://10.0.0.2:8080/sensor/connect");
        let descriptor = transport.discover().await.unwrap();
        assert_eq!(
            descriptor,
            TransportDescriptor::Socket {
                url: "ws://10.0.0.2:8080/sensor/connect".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_discover_without_endpoint() {
        let mut transport = WebSocketTransport::new("");
        assert!(matches!(
            transport.discover().await,
            Err(BridgeError::NoDeviceFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_messages_until_close() {
        let url = serve_messages(vec![r#"{"values":[12,34,56]}"#]).await;
        let mut transport = WebSocketTransport::new(&url);
        let descriptor = transport.discover().await.unwrap();
        transport.open(&descriptor).await.unwrap();
        assert!(transport.is_open());

        let frame = transport
            .read_frame(Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(frame.as_deref(), Some(r#"{"values":[12,34,56]}"#));

        let mut result = transport.read_frame(Duration::from_secs(2)).await;
        while let Ok(None) = result {
            result = transport.read_frame(Duration::from_secs(2)).await;
        }
        assert!(matches!(result, Err(BridgeError::LinkLost(_))));
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_close_sends_close_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            loop {
                match ws.next().await {
                    Some(Ok(Message::Close(_))) => return true,
                    Some(Ok(_)) => continue,
                    _ => return false,
                }
            }
        });

        let mut transport = WebSocketTransport::new(&format!("ws://{}/sensor/connect", addr));
        let descriptor = transport.discover().await.unwrap();
        transport.open(&descriptor).await.unwrap();
        transport.close().await;
        assert!(!transport.is_open());

        let saw_close = tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .unwrap()
            .unwrap();
        assert!(saw_close);
    }

    #[tokio::test]
    async fn test_open_unreachable_endpoint_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut transport = WebSocketTransport::new(&format!("ws://{}/sensor/connect", addr));
        let descriptor = transport.discover().await.unwrap();
        assert!(matches!(
            transport.open(&descriptor).await,
            Err(BridgeError::OpenFailed(_))
        ));
    }
}
