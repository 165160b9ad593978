mod reconnect;
mod signaling_connector;
mod signaling_event;
mod signaling_output;
mod signaling_transport;
mod ws_connector;

pub use reconnect::*;
pub use signaling_connector::*;
pub use signaling_event::*;
pub use signaling_output::*;
pub use signaling_transport::*;
pub use ws_connector::*;
