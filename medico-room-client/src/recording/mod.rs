mod room_recorder;
mod track_recorder;

pub use room_recorder::*;
