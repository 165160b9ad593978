use async_trait::async_trait;
use url::Url;

use crate::error::SignalingError;

/// One open signaling connection carrying JSON text frames.
#[async_trait]
pub trait SignalingSocket: Send {
    async fn send(&mut self, frame: String) -> Result<(), SignalingError>;

    /// Next text frame, or `None` once the server closed the connection.
    /// Must be cancel safe: it is raced against commands and timers.
    async fn recv(&mut self) -> Option<Result<String, SignalingError>>;

    async fn close(&mut self);
}

/// Opens signaling connections. Real clients use [`crate::WsConnector`].
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn SignalingSocket>, SignalingError>;
}
