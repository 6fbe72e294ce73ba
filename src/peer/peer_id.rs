use std::fmt;

use rand::Rng as _;

use crate::constants::CLIENT_PREFIX;

/// A 20-byte peer identifier.
///
/// Peer IDs are exchanged in the handshake and identify a session in the
/// swarm once the remote handshake has been read. Locally generated IDs
/// follow the Azureus-style format `-PW0001-<12 random bytes>`.
///
/// ```
/// use peerwire::peer::PeerId;
///
/// let peer_id = PeerId::generate();
/// assert_eq!(peer_id.client_id(), Some("PW0001"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub [u8; 20]);

impl PeerId {
    /// Generates a new random peer ID with the client prefix.
    pub fn generate() -> Self {
        let mut id = [0u8; 20];
        id[..8].copy_from_slice(CLIENT_PREFIX);
        rand::rng().fill(&mut id[8..]);
        Self(id)
    }

    /// Builds an ID from up to 20 bytes, zero-padding shorter input.
    ///
    /// Handy for fixed, human-readable IDs such as `b"boblog123"`.
    pub fn padded(bytes: &[u8]) -> Self {
        let mut id = [0u8; 20];
        let len = bytes.len().min(20);
        id[..len].copy_from_slice(&bytes[..len]);
        Self(id)
    }

    /// Returns the raw 20-byte peer ID.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Extracts the client identifier if using Azureus-style format.
    pub fn client_id(&self) -> Option<&str> {
        if self.0[0] == b'-' && self.0[7] == b'-' {
            std::str::from_utf8(&self.0[1..7]).ok()
        } else {
            None
        }
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trimmed = match self.0.iter().rposition(|&b| b != 0) {
            Some(last) => &self.0[..=last],
            None => &self.0[..0],
        };
        for byte in trimmed {
            if byte.is_ascii_alphanumeric() || *byte == b'-' {
                write!(f, "{}", *byte as char)?;
            } else {
                write!(f, "%{:02x}", byte)?;
            }
        }
        Ok(())
    }
}
