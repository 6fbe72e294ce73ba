//! HTTP tracker announce.
//!
//! Resolves an info hash to a list of peer addresses. Both the compact
//! 6-bytes-per-peer list and the dictionary list are understood.

mod error;
mod http;
mod response;

pub use error::TrackerError;
pub use http::HttpTracker;
pub use response::{parse_compact_peers, AnnounceResponse, TrackerEvent};
