//! peerwire - a BitTorrent download client
//!
//! Downloads a single-file torrent from the peers an HTTP tracker returns,
//! speaking the BEP-3 peer wire protocol.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 Bencode encoding/decoding
//! - [`metainfo`] - `.torrent` parsing and info hashes
//! - [`tracker`] - HTTP tracker announce
//! - [`peer`] - Handshake, message framing and per-peer sessions
//! - [`swarm`] - Piece availability, request scheduling and the coordinator
//! - [`storage`] - Positioned writes into the output file
//! - [`config`] - Client configuration

pub mod bencode;
pub mod config;
pub mod constants;
pub mod metainfo;
pub mod peer;
pub mod storage;
pub mod swarm;
pub mod tracker;

pub use bencode::{decode, encode, BencodeError, Value};
pub use config::{ClientConfig, ConfigError};
pub use metainfo::{Info, InfoHash, Metainfo, MetainfoError};
pub use peer::{
    Bitfield, ChokingState, Handshake, Message, PeerError, PeerId, PeerLink, PeerSession,
    SessionParams,
};
pub use storage::{PieceWriter, StorageError, WriteReport};
pub use swarm::{connect_peers, Swarm, SwarmError, SwarmEvent, SwarmOptions, SwarmOutcome};
pub use tracker::{AnnounceResponse, HttpTracker, TrackerError, TrackerEvent};
