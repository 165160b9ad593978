pub use medico_room_core::{ParticipantId, RoomAddress};

pub mod model {
    pub use medico_room_core::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use medico_room_client::*;
}
