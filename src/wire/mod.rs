//! Wire framing & auth channel (§4.A).
//!
//! Every packet is `"PKTV1"` + a 1-byte type + a 4-byte big-endian length +
//! that many payload bytes. `AUTH_ENCRYPTED_DATA` packets nest a complete
//! inner packet as their decrypted payload.

pub mod auth;
pub mod channel;
pub mod framing;

pub use auth::{AuthContext, AuthMethod, ConnType, HandshakeMode};
pub use channel::Channel;
pub use framing::{Packet, PacketType, MAGIC};
