//! Protocol constants and tuning parameters.
//!
//! Values that are part of the wire format live next to the codec in
//! [`crate::peer`]; this module holds client identification and the defaults
//! used by [`crate::config::ClientConfig`].

use std::time::Duration;

// ============================================================================
// Client identification
// ============================================================================

/// Client ID prefix for peer ID generation (Azureus-style)
pub const CLIENT_PREFIX: &[u8; 8] = b"-PW0001-";

/// User agent string for tracker requests
pub const USER_AGENT: &str = concat!("peerwire/", env!("CARGO_PKG_VERSION"));

/// Default BitTorrent listen port advertised to the tracker
pub const DEFAULT_PORT: u16 = 6881;

// ============================================================================
// Framing
// ============================================================================

/// Upper bound on a declared frame length before the frame is rejected.
///
/// Sessions raise this to fit a whole piece plus the `Piece` preamble when the
/// torrent's pieces are larger.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1 << 20;

/// Bytes in a `Piece` frame besides the block itself: kind, index, begin.
pub const PIECE_PREAMBLE_LEN: usize = 9;

// ============================================================================
// Connection limits
// ============================================================================

/// Maximum peers from a tracker response that we try to connect to.
pub const MAX_PEERS: usize = 50;

/// Capacity of the channel all peer sessions publish their messages into.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// Timeouts
// ============================================================================

/// TCP connect plus handshake exchange.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Silence from a peer after which its session is closed.
pub const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Idle time on the send path after which a keep-alive is written.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(90);

/// Outstanding request age after which the piece can be requested again.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Period of the coordinator's housekeeping tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Time the coordinator waits for every session to acknowledge shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for the tracker HTTP request.
pub const TRACKER_TIMEOUT: Duration = Duration::from_secs(30);
