use crate::peer::PeerId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Outstanding piece requests: for each piece, which peers were asked and
/// when.
///
/// A piece with any entry is not scheduled again until the entries are
/// cleared by a reply, a closed session, a choke, a failed write or expiry.
pub struct RequestLedger {
    pieces: Mutex<Vec<HashMap<PeerId, Instant>>>,
}

impl RequestLedger {
    pub fn new(piece_count: usize) -> Self {
        Self {
            pieces: Mutex::new(vec![HashMap::new(); piece_count]),
        }
    }

    pub fn record(&self, index: u32, peer: PeerId, sent_at: Instant) {
        if let Some(requests) = self.pieces.lock().get_mut(index as usize) {
            requests.insert(peer, sent_at);
        }
    }

    pub fn is_outstanding(&self, index: u32) -> bool {
        self.pieces
            .lock()
            .get(index as usize)
            .is_some_and(|requests| !requests.is_empty())
    }

    pub fn has_request(&self, index: u32, peer: PeerId) -> bool {
        self.pieces
            .lock()
            .get(index as usize)
            .is_some_and(|requests| requests.contains_key(&peer))
    }

    /// Removes `peer`'s request for `index`, returning when it was sent.
    pub fn remove(&self, index: u32, peer: PeerId) -> Option<Instant> {
        self.pieces
            .lock()
            .get_mut(index as usize)
            .and_then(|requests| requests.remove(&peer))
    }

    /// Drops every request for `index`, returning how many there were.
    pub fn clear_piece(&self, index: u32) -> usize {
        let mut pieces = self.pieces.lock();
        match pieces.get_mut(index as usize) {
            Some(requests) => {
                let count = requests.len();
                requests.clear();
                count
            }
            None => 0,
        }
    }

    /// Drops every request sent to `peer`, returning the affected pieces.
    pub fn clear_peer(&self, peer: PeerId) -> Vec<u32> {
        let mut pieces = self.pieces.lock();
        let mut cleared = Vec::new();
        for (index, requests) in pieces.iter_mut().enumerate() {
            if requests.remove(&peer).is_some() {
                cleared.push(index as u32);
            }
        }
        cleared
    }

    /// Drops requests sent more than `timeout` before `now`.
    pub fn expire(&self, now: Instant, timeout: Duration) -> Vec<(u32, PeerId)> {
        let mut pieces = self.pieces.lock();
        let mut expired = Vec::new();
        for (index, requests) in pieces.iter_mut().enumerate() {
            requests.retain(|peer, sent_at| {
                let stale = now.saturating_duration_since(*sent_at) > timeout;
                if stale {
                    expired.push((index as u32, *peer));
                }
                !stale
            });
        }
        expired
    }

    /// Total number of outstanding (piece, peer) requests.
    pub fn len(&self) -> usize {
        self.pieces.lock().iter().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
