//! Torrent metainfo handling.
//!
//! Parses a `.torrent` file into the handful of values the client needs: the
//! tracker URL, the piece geometry and the info hash that identifies the
//! torrent to trackers and peers.
//!
//! # Examples
//!
//! ```no_run
//! use peerwire::metainfo::Metainfo;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("example.torrent")?;
//! let torrent = Metainfo::from_bytes(&data)?;
//!
//! println!("Name: {}", torrent.info.name);
//! println!("Info hash: {}", torrent.info_hash);
//! println!("Pieces: {} x {} bytes", torrent.info.piece_count(), torrent.info.piece_length);
//! # Ok(())
//! # }
//! ```
//!
//! # Torrent Structure
//!
//! - **announce** - Tracker URL
//! - **info** - Hashed to create the info hash
//!   - `name` - Suggested file name
//!   - `piece length` - Size of each piece in bytes
//!   - `pieces` - Concatenated SHA1 hashes of each piece
//!   - `length` - Total size (single-file) OR `files` list (multi-file)

mod error;
mod info_hash;
mod torrent;

pub use error::MetainfoError;
pub use info_hash::InfoHash;
pub use torrent::{Info, Metainfo};
