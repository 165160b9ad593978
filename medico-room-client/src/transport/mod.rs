mod connection_wrapper;
mod peer_connection;
mod transport_event;

pub use connection_wrapper::*;
pub use peer_connection::*;
pub use transport_event::*;
