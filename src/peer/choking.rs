use super::message::Message;

/// The four choke/interest flags of one peer relationship.
///
/// `am_*` describe what we told the peer, `peer_*` what the peer told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChokingState {
    pub am_choking: bool,
    pub am_interested: bool,
    pub peer_choking: bool,
    pub peer_interested: bool,
}

impl ChokingState {
    /// True when the peer has unchoked us, i.e. it will serve our requests.
    pub fn can_request(&self) -> bool {
        !self.peer_choking
    }

    /// Updates our own flags after queueing `message` for the peer.
    pub fn record_sent(&mut self, message: &Message) {
        match message {
            Message::Choke => self.am_choking = true,
            Message::Unchoke => self.am_choking = false,
            Message::Interested => self.am_interested = true,
            Message::NotInterested => self.am_interested = false,
            _ => {}
        }
    }
}

/// Both sides start choked and uninterested.
impl Default for ChokingState {
    fn default() -> Self {
        Self {
            am_choking: true,
            am_interested: false,
            peer_choking: true,
            peer_interested: false,
        }
    }
}
