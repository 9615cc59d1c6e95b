//! Transport shared by members and clients: URL endpoints, reserved
//! sockets, length-delimited bincode framing and the per-member outbound
//! peer channels.

mod endpoint;
mod frame;
mod peer_channels;
mod reserved;

pub use endpoint::*;
pub use frame::*;
pub use peer_channels::*;
pub use reserved::*;
