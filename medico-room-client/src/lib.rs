mod chat;
mod config;
mod error;
mod media;
mod peer;
mod recording;
mod room;
mod signaling;
mod transport;

pub use chat::*;
pub use config::*;
pub use error::*;
pub use media::*;
pub use peer::*;
pub use recording::*;
pub use room::*;
pub use signaling::*;
pub use transport::*;
