use medico_room_core::{
    IceCandidate, IceServerConfig, Identity, MediaState, ParticipantId, RoomAddress,
    RosterEntry, SessionDescription, SignalingMessage,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::chat::ChatChannel;
use crate::config::RoomConfig;
use crate::error::{MediaError, RecordingError, RoomError};
use crate::media::{LocalMediaController, MediaDevices};
use crate::peer::{NegotiationState, PeerSession};
use crate::recording::{Recording, RoomRecorder};
use crate::room::participant::{Participant, RoomSnapshot};
use crate::room::room_command::{MediaReply, RoomCommand};
use crate::room::room_event::RoomEvent;
use crate::room::room_handle::RoomHandle;
use crate::signaling::{
    SignalingConnector, SignalingEvent, SignalingHandle, SignalingOutput, SignalingTransport,
};
use crate::transport::{
    PeerConnection, PeerConnectionFactory, PeerConnectionState, PeerKey, TransportEvent,
};

const COMMAND_CAPACITY: usize = 64;

/// Platform pieces a room runs on.
#[derive(Clone)]
pub struct RoomDeps {
    pub connector: Arc<dyn SignalingConnector>,
    pub peers: Arc<dyn PeerConnectionFactory>,
    pub devices: Arc<dyn MediaDevices>,
}

/// Owns the participant map and drives every other component from a single
/// event loop, so handlers never interleave.
pub struct RoomCoordinator {
    identity: Identity,
    local_id: ParticipantId,
    ice_servers: Vec<IceServerConfig>,
    participants: HashMap<ParticipantId, Participant>,
    media: LocalMediaController,
    chat: ChatChannel,
    recording_dir: PathBuf,
    recorder: Option<RoomRecorder>,
    signaling: SignalingHandle,
    signaling_rx: mpsc::UnboundedReceiver<SignalingEvent>,
    signaling_connected: bool,
    command_rx: mpsc::Receiver<RoomCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    peer_factory: Arc<dyn PeerConnectionFactory>,
    next_generation: u64,
    event_tx: mpsc::UnboundedSender<RoomEvent>,
}

impl RoomCoordinator {
    /// Starts local media, opens signaling for `address` and spawns the room
    /// loop. Media failures do not prevent joining; they are reported as
    /// [`RoomEvent::MediaError`].
    pub async fn join(
        address: RoomAddress,
        config: RoomConfig,
        deps: RoomDeps,
    ) -> Result<(RoomHandle, mpsc::UnboundedReceiver<RoomEvent>), RoomError> {
        let url = address.signaling_url(&config.signaling_base()?)?;
        let identity = config.identity();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut media =
            LocalMediaController::new(deps.devices, config.audio_enabled, config.video_enabled);
        for e in media.start().await {
            let _ = event_tx.send(RoomEvent::MediaError(e));
        }

        info!("Joining {} as {:?}", address, identity.username);
        let (signaling, signaling_rx) = SignalingTransport::connect(
            deps.connector,
            url,
            identity.clone(),
            config.reconnect_backoff(),
        );

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (transport_tx, transport_rx) = mpsc::channel(config.peer_event_capacity);

        let coordinator = Self {
            local_id: ParticipantId::from(identity.user_id.as_str()),
            identity,
            ice_servers: config.ice_servers,
            participants: HashMap::new(),
            media,
            chat: ChatChannel::new(Arc::new(signaling.clone())),
            recording_dir: config.recording_dir,
            recorder: None,
            signaling,
            signaling_rx,
            signaling_connected: false,
            command_rx,
            transport_rx,
            transport_tx,
            peer_factory: deps.peers,
            next_generation: 0,
            event_tx,
        };

        tokio::spawn(coordinator.run());

        Ok((RoomHandle::new(command_tx), event_rx))
    }

    async fn run(mut self) {
        info!("Room event loop started");

        loop {
            let screen_share_ended = self.media.screen_share_ended();

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(RoomCommand::Leave { reply }) => {
                            self.leave().await;
                            let _ = reply.send(());
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All room handles dropped, leaving");
                            self.leave().await;
                            break;
                        }
                    }
                }

                evt = self.signaling_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_signaling_event(e).await,
                        None => {
                            error!("Signaling transport stopped unexpectedly");
                            self.leave().await;
                            break;
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => self.handle_transport_event(evt).await,

                _ = screen_share_ended => self.on_screen_share_ended().await,
            }
        }

        info!("Room event loop finished");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::SetAudioEnabled { enabled, reply } => {
                let peers = connections(&self.participants);
                let result = self.media.set_audio_enabled(enabled, &peers).await;
                self.finish_media_change(result, reply);
            }

            RoomCommand::SetVideoEnabled { enabled, reply } => {
                let peers = connections(&self.participants);
                let result = self.media.set_video_enabled(enabled, &peers).await;
                self.finish_media_change(result, reply);
            }

            RoomCommand::SetDevice {
                kind,
                device_id,
                reply,
            } => {
                let peers = connections(&self.participants);
                let result = self.media.set_device(kind, &device_id, &peers).await;
                self.finish_media_change(result, reply);
            }

            RoomCommand::StartScreenShare { reply } => {
                let peers = connections(&self.participants);
                let result = self.media.start_screen_share(&peers).await;
                self.finish_media_change(result, reply);
            }

            RoomCommand::StopScreenShare { reply } => {
                let peers = connections(&self.participants);
                let result = self.media.stop_screen_share(&peers).await;
                self.finish_media_change(result, reply);
            }

            RoomCommand::ListDevices { reply } => {
                let _ = reply.send(self.media.devices().await);
            }

            RoomCommand::SendChat { text, reply } => {
                let sent = self.chat.send(&text);
                if let Some(message) = &sent {
                    self.emit(RoomEvent::Chat(message.clone()));
                }
                let _ = reply.send(sent);
            }

            RoomCommand::MarkChatRead => self.chat.mark_read(),

            RoomCommand::StartRecording { reply } => {
                let _ = reply.send(self.start_recording().await);
            }

            RoomCommand::StopRecording { reply } => {
                let _ = reply.send(self.stop_recording().await);
            }

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            // Handled by the loop itself.
            RoomCommand::Leave { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn finish_media_change(&mut self, result: Result<(), MediaError>, reply: MediaReply) {
        let result = match result {
            Ok(()) => {
                self.broadcast_media_state();
                Ok(self.media.state())
            }
            Err(e) => {
                warn!("Media change failed: {}", e);
                Err(e)
            }
        };
        let _ = reply.send(result);
    }

    async fn start_recording(&mut self) -> Result<PathBuf, RecordingError> {
        if self.recorder.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let mut recorder = RoomRecorder::start(&self.recording_dir).await?;
        for participant in self.participants.values() {
            for track in &participant.tracks {
                recorder.add_track(&participant.id, track);
            }
        }
        let dir = recorder.dir().to_owned();
        self.recorder = Some(recorder);

        self.notify("Recording started");
        Ok(dir)
    }

    async fn stop_recording(&mut self) -> Result<Recording, RecordingError> {
        let recorder = self.recorder.take().ok_or(RecordingError::NotRecording)?;
        let recording = recorder.stop().await;

        self.notify("Recording stopped");
        Ok(recording)
    }

    async fn on_screen_share_ended(&mut self) {
        info!("Screen share ended by the platform, restoring camera");

        let peers = connections(&self.participants);
        if let Err(e) = self.media.stop_screen_share(&peers).await {
            self.emit(RoomEvent::MediaError(e));
        }
        self.broadcast_media_state();
    }

    async fn handle_signaling_event(&mut self, event: SignalingEvent) {
        match event {
            SignalingEvent::Connected => {
                self.signaling_connected = true;
                self.emit(RoomEvent::SignalingConnected(true));
            }

            SignalingEvent::Disconnected => {
                warn!("Signaling lost; peer connections stay up");
                self.signaling_connected = false;
                self.emit(RoomEvent::SignalingConnected(false));
            }

            SignalingEvent::Message(message) => self.handle_message(message).await,
        }
    }

    async fn handle_message(&mut self, message: SignalingMessage) {
        if let Some(target) = message.target() {
            if *target != self.local_id {
                debug!("Dropping '{}' addressed to {}", message.name(), target);
                return;
            }
        }

        match message {
            SignalingMessage::WebrtcConfig { config } => {
                if !config.ice_servers.is_empty() {
                    debug!("Using {} ICE server(s) from the server", config.ice_servers.len());
                    self.ice_servers = config.ice_servers;
                }
            }

            SignalingMessage::ParticipantsList { participants } => {
                self.on_roster(participants).await;
            }

            SignalingMessage::UserJoined {
                ref client_id,
                ref username,
                ..
            } => {
                if *client_id == self.local_id || self.participants.contains_key(client_id) {
                    debug!("Ignoring repeated user_joined for {}", client_id);
                    return;
                }
                let (id, name) = (client_id.clone(), username.clone());
                self.record_chat(&message);
                self.on_user_joined(id, name).await;
            }

            SignalingMessage::UserLeft { ref client_id, .. } => {
                if !self.participants.contains_key(client_id) {
                    debug!("user_left for unknown participant {}", client_id);
                    return;
                }
                let id = client_id.clone();
                self.record_chat(&message);
                self.remove_participant(&id).await;
            }

            SignalingMessage::Offer { offer, from, .. } => {
                let Some(from) = from else {
                    warn!("Dropping offer without sender");
                    return;
                };
                self.on_offer(from, offer).await;
            }

            SignalingMessage::Answer { answer, from, .. } => {
                let Some(from) = from else {
                    warn!("Dropping answer without sender");
                    return;
                };
                self.on_answer(from, answer).await;
            }

            SignalingMessage::IceCandidate {
                candidate, from, ..
            } => {
                let Some(from) = from else {
                    warn!("Dropping ICE candidate without sender");
                    return;
                };
                self.on_remote_candidate(from, candidate).await;
            }

            SignalingMessage::Chat { .. } => self.record_chat(&message),

            SignalingMessage::MediaStateUpdate {
                client_id,
                audio_enabled,
                video_enabled,
                screen_sharing,
            } => {
                let Some(participant) = self.participants.get_mut(&client_id) else {
                    return;
                };
                participant.media = MediaState {
                    audio_enabled,
                    video_enabled,
                    screen_sharing,
                };
                let media = participant.media;
                self.emit(RoomEvent::ParticipantMediaChanged {
                    id: client_id,
                    media,
                });
            }

            SignalingMessage::Ping | SignalingMessage::Pong | SignalingMessage::Unknown => {}
        }
    }

    /// The roster arrives on every (re)connect. It names our own client id
    /// and is authoritative for who is still in the room and what they send.
    async fn on_roster(&mut self, roster: Vec<RosterEntry>) {
        if let Some(me) = self.find_self(&roster) {
            if me != self.local_id {
                info!("Server assigned client id {}", me);
                self.local_id = me;
            }
        }

        let gone: Vec<ParticipantId> = self
            .participants
            .keys()
            .filter(|id| !roster.iter().any(|e| &e.client_id == *id))
            .cloned()
            .collect();
        for id in gone {
            info!("{} is no longer in the room", id);
            self.remove_participant(&id).await;
        }

        // Existing members offer to newcomers; we only prepare sessions.
        for entry in roster {
            if entry.client_id == self.local_id {
                continue;
            }

            if let Some(participant) = self.participants.get_mut(&entry.client_id) {
                let media = MediaState {
                    audio_enabled: entry.audio_enabled,
                    video_enabled: entry.video_enabled,
                    screen_sharing: participant.media.screen_sharing,
                };
                if media != participant.media {
                    participant.media = media;
                    self.emit(RoomEvent::ParticipantMediaChanged {
                        id: entry.client_id,
                        media,
                    });
                }
                continue;
            }

            let media = MediaState {
                audio_enabled: entry.audio_enabled,
                video_enabled: entry.video_enabled,
                screen_sharing: false,
            };
            if let Some(participant) = self
                .create_participant(entry.client_id, entry.username, media)
                .await
            {
                self.insert_participant(participant);
            }
        }

        self.broadcast_media_state();
    }

    /// Our own roster entry. The same account may be in the room more than
    /// once: the id we already hold wins, then the newest entry nobody else
    /// is known by.
    fn find_self(&self, roster: &[RosterEntry]) -> Option<ParticipantId> {
        let user_id = self.identity.user_id.as_str();
        let mut mine = roster
            .iter()
            .filter(|e| e.user_id.as_deref() == Some(user_id))
            .map(|e| &e.client_id);

        if mine.clone().any(|id| *id == self.local_id) {
            return Some(self.local_id.clone());
        }
        mine.rfind(|id| !self.participants.contains_key(*id)).cloned()
    }

    async fn on_user_joined(&mut self, id: ParticipantId, name: String) {
        let Some(mut participant) = self
            .create_participant(id.clone(), name, MediaState::default())
            .await
        else {
            return;
        };

        match participant.session.start_offer(self.media.session()).await {
            Ok(offer) => self.signaling.send_offer(&id, &self.local_id, offer),
            Err(e) => warn!("Failed to offer to {}: {}", id, e),
        }

        self.insert_participant(participant);
    }

    async fn on_offer(&mut self, from: ParticipantId, offer: SessionDescription) {
        let reset = match self.participants.get(&from).map(|p| p.session.state()) {
            None => None,
            Some(NegotiationState::New) => Some(false),
            // Both sides offered: the smaller client id keeps its own offer.
            Some(NegotiationState::Offering) if self.local_id < from => {
                debug!("Offer collision with {}, keeping ours", from);
                return;
            }
            // A fresh offer on a negotiated session means the remote side
            // rebuilt its connection.
            Some(_) => Some(true),
        };

        match reset {
            None => {
                let name = from.to_string();
                let Some(participant) = self
                    .create_participant(from.clone(), name, MediaState::default())
                    .await
                else {
                    return;
                };
                self.insert_participant(participant);
            }
            Some(true) => {
                if !self.reset_session(&from).await {
                    return;
                }
            }
            Some(false) => {}
        }

        let Some(participant) = self.participants.get_mut(&from) else {
            return;
        };
        match participant
            .session
            .accept_offer(offer, self.media.session())
            .await
        {
            Ok(answer) => self.signaling.send_answer(&from, &self.local_id, answer),
            Err(e) => warn!("Failed to answer offer from {}: {}", from, e),
        }
    }

    async fn on_answer(&mut self, from: ParticipantId, answer: SessionDescription) {
        let Some(participant) = self.participants.get_mut(&from) else {
            debug!("Dropping answer from unknown participant {}", from);
            return;
        };
        if let Err(e) = participant.session.accept_answer(answer).await {
            warn!("Failed to apply answer from {}: {}", from, e);
        }
    }

    async fn on_remote_candidate(&mut self, from: ParticipantId, candidate: IceCandidate) {
        let Some(participant) = self.participants.get_mut(&from) else {
            debug!("Dropping ICE candidate from unknown participant {}", from);
            return;
        };
        if let Err(e) = participant.session.add_remote_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {}", from, e);
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        // Events queued by a connection that has since been closed or
        // replaced, including the `Closed` it reports on the way out.
        let current = self
            .participants
            .get(event.participant())
            .map(|p| p.generation);
        if current != Some(event.key().generation) {
            debug!("Dropping transport event from stale connection {}", event.key());
            return;
        }

        match event {
            TransportEvent::CandidateGenerated(key, candidate) => {
                self.signaling.send_ice(&key.participant, &self.local_id, candidate);
            }

            TransportEvent::RemoteTrack(PeerKey { participant: id, .. }, track) => {
                if let Some(participant) = self.participants.get_mut(&id) {
                    participant.set_track(track.clone());
                }
                if let Some(recorder) = &mut self.recorder {
                    recorder.add_track(&id, &track);
                }
                self.emit(RoomEvent::RemoteTrack { id, track });
            }

            TransportEvent::StateChanged(PeerKey { participant: id, .. }, state) => {
                if let Some(participant) = self.participants.get_mut(&id) {
                    participant.connection_state = state;
                }
                self.emit(RoomEvent::PeerConnectionChanged {
                    id: id.clone(),
                    state,
                });

                if state == PeerConnectionState::Failed {
                    warn!("Connection to {} failed, removing participant", id);
                    self.remove_participant(&id).await;
                }
            }
        }
    }

    async fn create_participant(
        &mut self,
        id: ParticipantId,
        name: String,
        media: MediaState,
    ) -> Option<Participant> {
        let (session, generation) = self.new_session(&id).await?;
        Some(Participant::new(id, name, media, session, generation))
    }

    async fn new_session(&mut self, id: &ParticipantId) -> Option<(PeerSession, u64)> {
        self.next_generation += 1;
        let key = PeerKey::new(id.clone(), self.next_generation);

        match self
            .peer_factory
            .create(key, &self.ice_servers, self.transport_tx.clone())
            .await
        {
            Ok(connection) => {
                let session = PeerSession::new(id.clone(), connection);
                Some((session, self.next_generation))
            }
            Err(e) => {
                error!("Failed to create peer connection for {}: {:#}", id, e);
                None
            }
        }
    }

    /// Swaps in a fresh session for `id`, closing the old one.
    async fn reset_session(&mut self, id: &ParticipantId) -> bool {
        let Some((session, generation)) = self.new_session(id).await else {
            return false;
        };
        let Some(participant) = self.participants.get_mut(id) else {
            return false;
        };
        let mut old = std::mem::replace(&mut participant.session, session);
        participant.generation = generation;
        participant.tracks.clear();
        participant.connection_state = PeerConnectionState::New;
        old.close().await;
        true
    }

    fn insert_participant(&mut self, participant: Participant) {
        info!("{} ({}) is in the room", participant.name, participant.id);
        self.emit(RoomEvent::ParticipantJoined(participant.snapshot()));
        self.participants.insert(participant.id.clone(), participant);
    }

    async fn remove_participant(&mut self, id: &ParticipantId) {
        let Some(mut participant) = self.participants.remove(id) else {
            return;
        };
        participant.session.close().await;

        info!("{} ({}) left", participant.name, id);
        self.emit(RoomEvent::ParticipantLeft {
            id: participant.id,
            name: participant.name,
        });
    }

    fn record_chat(&mut self, message: &SignalingMessage) {
        let participants = &self.participants;
        let entry = self
            .chat
            .on_receive(message, |id| participants.get(id).map(|p| p.name.clone()));
        if let Some(entry) = entry {
            self.emit(RoomEvent::Chat(entry));
        }
    }

    fn notify(&mut self, text: &str) {
        let entry = self.chat.system(text);
        self.emit(RoomEvent::Chat(entry));
    }

    fn broadcast_media_state(&self) {
        let state = self.media.state();
        self.signaling.send_media_state(&self.local_id, state);
        self.emit(RoomEvent::LocalMediaChanged(state));
    }

    fn snapshot(&self) -> RoomSnapshot {
        let mut participants: Vec<_> = self.participants.values().map(|p| p.snapshot()).collect();
        participants.sort_by(|a, b| a.id.cmp(&b.id));

        RoomSnapshot {
            local_id: self.local_id.clone(),
            signaling_connected: self.signaling_connected,
            local_media: self.media.state(),
            participants,
            chat: self.chat.history().to_vec(),
            unread: self.chat.unread(),
            recording: self.recorder.is_some(),
        }
    }

    async fn leave(&mut self) {
        info!("Leaving room");

        self.media.stop_all();
        if let Some(recorder) = self.recorder.take() {
            let recording = recorder.stop().await;
            info!("Recording saved to {}", recording.dir.display());
        }
        self.signaling.close().await;
        for (_, mut participant) in self.participants.drain() {
            participant.session.close().await;
        }

        self.emit(RoomEvent::Left);
    }

    fn emit(&self, event: RoomEvent) {
        let _ = self.event_tx.send(event);
    }
}

fn connections(participants: &HashMap<ParticipantId, Participant>) -> Vec<&dyn PeerConnection> {
    participants
        .values()
        .map(|p| p.session.connection())
        .collect()
}
