//! Peer wire protocol.
//!
//! This module covers one connection to one remote peer: the 68-byte
//! handshake, the length-prefixed message framing, the choke/interest flags
//! and the [`PeerSession`] task that owns the socket.
//!
//! # Framing
//!
//! Every message after the handshake is a 4-byte big-endian length followed
//! by that many bytes: a kind byte and its payload. A zero length is a
//! keep-alive and has no kind byte.
//!
//! ```
//! use peerwire::peer::Message;
//!
//! let frame = Message::Have { piece: 7 }.encode();
//! assert_eq!(&frame[..], &[0, 0, 0, 5, 4, 0, 0, 0, 7]);
//! ```

mod bitfield;
mod choking;
mod error;
mod message;
mod peer_id;
mod session;

pub use bitfield::Bitfield;
pub use choking::ChokingState;
pub use error::PeerError;
pub use message::{read_handshake, FrameReader, Handshake, Message, MessageId, HANDSHAKE_LEN};
pub use peer_id::PeerId;
pub use session::{SwarmEvent, PeerLink, PeerSession, SessionParams, SessionPhase};
