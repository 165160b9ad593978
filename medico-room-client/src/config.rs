use medico_room_core::utils::default_stun_servers;
use medico_room_core::{IceServerConfig, Identity};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::RoomError;

/// Settings of one room session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Base url of the signaling server; `/ws/{join_code}/{password}` is appended.
    pub signaling_url: String,
    pub reconnect_backoff_ms: u64,
    /// Used until the server pushes its own list in `webrtc_config`.
    pub ice_servers: Vec<IceServerConfig>,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub peer_event_capacity: usize,
    /// Each recording gets its own directory below this one.
    pub recording_dir: PathBuf,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://localhost:8000".to_owned(),
            reconnect_backoff_ms: 5_000,
            ice_servers: vec![IceServerConfig {
                urls: default_stun_servers(),
                username: None,
                credential: None,
            }],
            user_id: None,
            display_name: None,
            audio_enabled: true,
            video_enabled: true,
            peer_event_capacity: 256,
            recording_dir: PathBuf::from("recordings"),
        }
    }
}

impl RoomConfig {
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id.clone(), self.display_name.clone())
    }

    pub fn signaling_base(&self) -> Result<Url, RoomError> {
        Url::parse(&self.signaling_url).map_err(|e| RoomError::InvalidServerUrl {
            url: self.signaling_url.clone(),
            reason: e.to_string(),
        })
    }
}
