use thiserror::Error;

/// Errors that end a peer session.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Network I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a handshake or frame.
    #[error("stream ended mid-frame")]
    ShortRead,

    /// A frame's declared length or payload does not fit its kind.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Received an unknown message ID.
    #[error("invalid message id: {0}")]
    InvalidMessageId(u8),

    /// The peer's handshake did not start with the BitTorrent protocol header.
    #[error("invalid handshake")]
    InvalidHandshake,

    /// The handshake was well formed but names the wrong torrent or peer.
    #[error("handshake mismatch: {0}")]
    HandshakeMismatch(&'static str),

    /// The connection was closed by the peer or the session has ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// Connect, handshake or read timed out.
    #[error("timeout")]
    Timeout,
}
