//! Stack-ordered bit storage for hidden messages in flight.
//!
//! Bytes are loaded most-significant-bit first and bits are consumed from the
//! tail, so the carrier sees the message back to front. The receiving side
//! appends bits in carrier order and undoes this with [`Bitstream::reverse`]
//! before packing bytes again.

/// An ordered sequence of bits with push/pop at the tail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitstream {
    bits: Vec<bool>,
}

impl Bitstream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load bytes, most significant bit of each byte first.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut stream = Self {
            bits: Vec::with_capacity(bytes.len() * 8),
        };
        stream.extend_from_bytes(bytes);
        stream
    }

    /// Append bytes, most significant bit of each byte first.
    pub fn extend_from_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            for shift in (0..8).rev() {
                self.bits.push((byte >> shift) & 1 == 1);
            }
        }
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Remove and return the most recently appended bit.
    pub fn pop(&mut self) -> Option<bool> {
        self.bits.pop()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Drop bits past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.bits.truncate(len);
    }

    /// Drop the trailing partial byte, if any.
    pub fn truncate_to_byte_boundary(&mut self) {
        let whole = self.bits.len() - self.bits.len() % 8;
        self.bits.truncate(whole);
    }

    /// Reverse the bit order in place.
    ///
    /// This is the byte-order and bit-order reversal in one step: a stream
    /// collected in pop order becomes the original MSB-first sequence.
    pub fn reverse(&mut self) {
        self.bits.reverse();
    }

    /// Pack into bytes, most significant bit first. A trailing partial byte
    /// is zero-padded on the right.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << (7 - i)))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }
}

impl FromIterator<bool> for Bitstream {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}
