mod participant;
mod room_command;
mod room_coordinator;
mod room_event;
mod room_handle;

pub use participant::*;
pub use room_command::*;
pub use room_coordinator::*;
pub use room_event::*;
pub use room_handle::*;
