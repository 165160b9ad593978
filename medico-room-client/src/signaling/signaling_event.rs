use medico_room_core::SignalingMessage;

/// What the signaling transport reports to the room loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    /// A connection is open and the identity frame has been sent.
    Connected,

    /// The open connection was lost; a reconnect is already scheduled.
    Disconnected,

    /// A decoded application frame. `ping` never shows up here.
    Message(SignalingMessage),
}
