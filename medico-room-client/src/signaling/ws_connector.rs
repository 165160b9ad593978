use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::error::SignalingError;
use crate::signaling::signaling_connector::{SignalingConnector, SignalingSocket};

/// WebSocket connector for the room signaling endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn SignalingSocket>, SignalingError> {
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| SignalingError::Connect(e.to_string()))?;
        debug!("WebSocket handshake finished with {}", response.status());

        Ok(Box::new(WsSocket { stream }))
    }
}

struct WsSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl SignalingSocket for WsSocket {
    async fn send(&mut self, frame: String) -> Result<(), SignalingError> {
        self.stream
            .send(Message::Text(frame))
            .await
            .map_err(|e| SignalingError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, SignalingError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("Skipping non UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!("Server closed signaling socket: {:?}", frame);
                    return None;
                }
                // tungstenite answers protocol pings on its own
                Ok(_) => continue,
                Err(e) => return Some(Err(SignalingError::Receive(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
