mod local_media_controller;
mod local_session;
mod local_track;
mod media_devices;
mod synthetic_devices;

pub use local_media_controller::*;
pub use local_session::*;
pub use local_track::*;
pub use media_devices::*;
pub use synthetic_devices::*;
