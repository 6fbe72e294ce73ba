use crate::peer::{Bitfield, PeerId};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

/// Which peers are known to hold each piece.
///
/// Holder sets only grow: a peer that disconnects stays listed, and the
/// scheduler skips holders that have no live session.
pub struct PieceLedger {
    holders: RwLock<Vec<HashSet<PeerId>>>,
}

impl PieceLedger {
    pub fn new(piece_count: usize) -> Self {
        Self {
            holders: RwLock::new(vec![HashSet::new(); piece_count]),
        }
    }

    pub fn piece_count(&self) -> usize {
        self.holders.read().len()
    }

    /// Records every piece set in a `Bitfield` payload.
    ///
    /// Bits past the piece count are ignored.
    pub fn record_bitfield(&self, peer: PeerId, payload: &[u8]) {
        let mut holders = self.holders.write();
        let bits = Bitfield::from_payload(payload, holders.len());
        for index in bits.ones() {
            holders[index].insert(peer);
        }
    }

    pub fn record_have(&self, peer: PeerId, index: u32) {
        let mut holders = self.holders.write();
        match holders.get_mut(index as usize) {
            Some(set) => {
                set.insert(peer);
            }
            None => trace!(%peer, index, "have for out-of-range piece"),
        }
    }

    /// Snapshot of the holders of `index`; empty when out of range.
    pub fn holders_of(&self, index: u32) -> HashSet<PeerId> {
        self.holders
            .read()
            .get(index as usize)
            .cloned()
            .unwrap_or_default()
    }

    pub fn availability(&self, index: u32) -> usize {
        self.holders
            .read()
            .get(index as usize)
            .map_or(0, HashSet::len)
    }

    /// One entry per piece: true when at least one peer holds it.
    pub fn summary(&self) -> Vec<bool> {
        self.holders.read().iter().map(|set| !set.is_empty()).collect()
    }
}

impl fmt::Display for PieceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for available in self.summary() {
            f.write_str(if available { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for PieceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PieceLedger")
            .field("summary", &self.to_string())
            .finish()
    }
}
