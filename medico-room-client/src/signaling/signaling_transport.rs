use medico_room_core::{Identity, SignalingMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::SignalingError;
use crate::signaling::reconnect::ReconnectScheduler;
use crate::signaling::signaling_connector::{SignalingConnector, SignalingSocket};
use crate::signaling::signaling_event::SignalingEvent;
use crate::signaling::signaling_output::SignalingOutput;

#[derive(Debug)]
enum TransportCommand {
    Send(SignalingMessage),
    Close,
}

/// Cloneable handle to a running signaling transport.
#[derive(Clone)]
pub struct SignalingHandle {
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    connected: watch::Receiver<bool>,
}

impl SignalingHandle {
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Closes the connection for good and waits for the transport task to stop.
    pub async fn close(&self) {
        let _ = self.command_tx.send(TransportCommand::Close);
        self.command_tx.closed().await;
    }
}

impl SignalingOutput for SignalingHandle {
    fn send(&self, message: SignalingMessage) {
        let name = message.name();
        if self.command_tx.send(TransportCommand::Send(message)).is_err() {
            warn!("Signaling transport stopped, dropping '{}' frame", name);
        }
    }
}

pub struct SignalingTransport {
    connector: Arc<dyn SignalingConnector>,
    url: Url,
    identity: Identity,
    socket: Option<Box<dyn SignalingSocket>>,
    reconnect: ReconnectScheduler,
    command_rx: mpsc::UnboundedReceiver<TransportCommand>,
    event_tx: mpsc::UnboundedSender<SignalingEvent>,
    connected_tx: watch::Sender<bool>,
}

impl SignalingTransport {
    /// Spawns the transport task. The first connection attempt starts right
    /// away; failures are retried after `backoff`.
    pub fn connect(
        connector: Arc<dyn SignalingConnector>,
        url: Url,
        identity: Identity,
        backoff: Duration,
    ) -> (SignalingHandle, mpsc::UnboundedReceiver<SignalingEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (connected_tx, connected) = watch::channel(false);

        let transport = Self {
            connector,
            url,
            identity,
            socket: None,
            reconnect: ReconnectScheduler::new(backoff),
            command_rx,
            event_tx,
            connected_tx,
        };

        tokio::spawn(transport.run());

        (
            SignalingHandle {
                command_tx,
                connected,
            },
            event_rx,
        )
    }

    async fn run(mut self) {
        info!("Signaling transport started for {}", self.host());

        let mut running = self.open().await;

        while running {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(TransportCommand::Send(message)) => self.send(message).await,
                        Some(TransportCommand::Close) | None => running = false,
                    }
                }

                frame = next_frame(&mut self.socket) => self.handle_frame(frame).await,

                _ = self.reconnect.fired() => {
                    debug!("Reconnect timer fired");
                    running = self.open().await;
                }
            }
        }

        self.reconnect.cancel();
        if let Some(mut socket) = self.socket.take() {
            socket.close().await;
        }
        self.connected_tx.send_replace(false);

        info!("Signaling transport finished");
    }

    /// One connection attempt. Commands keep being served while the connect
    /// is pending; returns `false` if a close arrived in the meantime.
    async fn open(&mut self) -> bool {
        let connector = self.connector.clone();
        let connecting = connector.connect(&self.url);
        tokio::pin!(connecting);

        let result = loop {
            tokio::select! {
                result = &mut connecting => break result,

                cmd = self.command_rx.recv() => match cmd {
                    Some(TransportCommand::Send(message)) => {
                        warn!("Signaling still connecting, dropping '{}' frame", message.name());
                    }
                    Some(TransportCommand::Close) | None => {
                        info!("Close requested while connecting to {}", self.host());
                        return false;
                    }
                },
            }
        };

        let mut socket = match result {
            Ok(socket) => socket,
            Err(e) => {
                warn!("Signaling connect to {} failed: {}", self.host(), e);
                self.reconnect.schedule();
                return true;
            }
        };

        if let Err(e) = announce(&self.identity, socket.as_mut()).await {
            warn!("Failed to announce identity: {}", e);
            socket.close().await;
            self.reconnect.schedule();
            return true;
        }

        self.reconnect.cancel();
        self.socket = Some(socket);
        self.connected_tx.send_replace(true);
        info!("Signaling connected as {:?}", self.identity.username);
        let _ = self.event_tx.send(SignalingEvent::Connected);
        true
    }

    async fn send(&mut self, message: SignalingMessage) {
        let Some(socket) = self.socket.as_mut() else {
            warn!("Signaling not connected, dropping '{}' frame", message.name());
            return;
        };

        let frame = match serde_json::to_string(&message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode '{}' frame: {}", message.name(), e);
                return;
            }
        };

        if let Err(e) = socket.send(frame).await {
            warn!("{}", e);
            self.connection_lost().await;
        }
    }

    async fn handle_frame(&mut self, frame: Option<Result<String, SignalingError>>) {
        let text = match frame {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                warn!("{}", e);
                self.connection_lost().await;
                return;
            }
            None => {
                info!("Signaling connection closed by server");
                self.connection_lost().await;
                return;
            }
        };

        let message = match serde_json::from_str::<SignalingMessage>(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring malformed signaling frame: {}", e);
                return;
            }
        };

        match message {
            SignalingMessage::Ping => self.send(SignalingMessage::Pong).await,
            SignalingMessage::Unknown => debug!("Ignoring frame of unknown type"),
            message => {
                let _ = self.event_tx.send(SignalingEvent::Message(message));
            }
        }
    }

    async fn connection_lost(&mut self) {
        let Some(mut socket) = self.socket.take() else {
            return;
        };
        socket.close().await;

        self.connected_tx.send_replace(false);
        let _ = self.event_tx.send(SignalingEvent::Disconnected);

        if self.reconnect.schedule() {
            info!("Signaling lost, reconnect scheduled");
        }
    }

    /// Host part only: the url path carries the room password.
    fn host(&self) -> String {
        self.url.host_str().unwrap_or("<no host>").to_owned()
    }
}

async fn announce(identity: &Identity, socket: &mut dyn SignalingSocket) -> Result<(), SignalingError> {
    let hello = serde_json::to_string(identity)?;
    socket.send(hello).await
}

async fn next_frame(
    socket: &mut Option<Box<dyn SignalingSocket>>,
) -> Option<Result<String, SignalingError>> {
    match socket {
        Some(socket) => socket.recv().await,
        None => std::future::pending().await,
    }
}
