use bytes::Bytes;
use std::fmt;

/// A fixed-length bit vector with one bit per piece.
///
/// Bits are numbered from the high bit of the first byte, the same order the
/// `Bitfield` wire message uses, so a peer's payload can be wrapped directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitfield {
    bits: Vec<u8>,
    piece_count: usize,
}

impl Bitfield {
    /// Creates a new empty bitfield for the given number of pieces.
    pub fn new(piece_count: usize) -> Self {
        Self {
            bits: vec![0; piece_count.div_ceil(8)],
            piece_count,
        }
    }

    /// Wraps a wire payload.
    ///
    /// Short payloads are zero-extended; long payloads and spare bits past
    /// `piece_count` are discarded.
    pub fn from_payload(payload: &[u8], piece_count: usize) -> Self {
        let mut bits = payload.to_vec();
        bits.resize(piece_count.div_ceil(8), 0);

        let mut bf = Self { bits, piece_count };
        bf.clear_spare_bits();
        bf
    }

    pub fn has(&self, index: usize) -> bool {
        if index >= self.piece_count {
            return false;
        }
        (self.bits[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    /// Sets the bit for `index`; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize) {
        if index >= self.piece_count {
            return;
        }
        self.bits[index / 8] |= 1 << (7 - index % 8);
    }

    /// Returns the number of set bits.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Returns true if every piece's bit is set.
    pub fn is_complete(&self) -> bool {
        self.count() == self.piece_count
    }

    pub fn len(&self) -> usize {
        self.piece_count
    }

    pub fn is_empty(&self) -> bool {
        self.piece_count == 0
    }

    /// Iterates over the indices of set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.piece_count).filter(move |&i| self.has(i))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bits)
    }

    fn clear_spare_bits(&mut self) {
        let spare = self.bits.len() * 8 - self.piece_count;
        if spare > 0 && spare < 8 {
            if let Some(last) = self.bits.last_mut() {
                *last &= 0xFFu8 << spare;
            }
        }
    }
}

/// Renders one `0`/`1` character per piece.
impl fmt::Display for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.piece_count {
            f.write_str(if self.has(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}
