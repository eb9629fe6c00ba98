//! Hidden messages spread over a sequence of carrier messages.
//!
//! A single header block rarely has enough letters for a whole message, so
//! each direction of a session keeps one stream alive across as many carriers
//! as it takes.

use crate::codec::bitstream::Bitstream;
use crate::codec::case::{self, Decoded, Encoded};
use crate::error::ProtocolError;
use crate::http::headers::HeaderBlock;

/// Outgoing hidden message, drained one carrier at a time.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    bits: Bitstream,
    total_bits: usize,
    terminated: bool,
}

impl OutboundMessage {
    pub fn new(message: &[u8]) -> Self {
        let bits = Bitstream::from_bytes(message);
        Self {
            total_bits: bits.len(),
            bits,
            terminated: false,
        }
    }

    /// Bits not yet written into any carrier.
    pub fn remaining_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn total_bits(&self) -> usize {
        self.total_bits
    }

    /// The terminator has been sent; the peer can reassemble the message.
    pub fn is_complete(&self) -> bool {
        self.terminated
    }

    /// Encode as much as fits into `headers`.
    ///
    /// Once every bit is placed, the next carrier gets a zero-bit
    /// terminator. Fails when a carrier takes nothing at all, since repeating
    /// it would never make progress.
    pub fn fill(&mut self, headers: &mut HeaderBlock) -> Result<Encoded, ProtocolError> {
        if self.terminated {
            return Ok(Encoded {
                bits_written: 0,
                terminated: true,
            });
        }

        let encoded = if self.bits.is_empty() {
            case::terminate(headers)
        } else {
            case::encode(headers, &mut self.bits)
        };

        if !encoded.terminated && encoded.bits_written == 0 {
            return Err(ProtocolError::NoCarrierCapacity {
                remaining: self.bits.len(),
            });
        }

        self.terminated = encoded.terminated;
        Ok(encoded)
    }
}

/// Incoming hidden message, accumulated until a terminator arrives.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    bits: Bitstream,
    carriers: usize,
}

impl InboundMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits collected so far for the message in progress.
    pub fn bits_received(&self) -> usize {
        self.bits.len()
    }

    /// Carriers absorbed for the message in progress.
    pub fn carriers(&self) -> usize {
        self.carriers
    }

    /// Decode one carrier. Returns the message once its terminator is seen
    /// and starts over with an empty stream.
    pub fn absorb(&mut self, headers: &HeaderBlock) -> Option<Vec<u8>> {
        self.carriers += 1;
        match case::decode(headers, &mut self.bits) {
            Decoded::Pending { .. } => None,
            Decoded::Complete { padding, .. } => {
                let bits = std::mem::take(&mut self.bits);
                self.carriers = 0;
                Some(case::recover_message(bits, padding))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::headers::HeaderField;

    fn request_headers() -> HeaderBlock {
        [
            HeaderField::new("Host", " example.com"),
            HeaderField::new("User-Agent", " curl/8.0"),
            HeaderField::new("Accept", " */*"),
        ]
        .into_iter()
        .collect()
    }

    fn relay(message: &[u8]) -> (Vec<u8>, usize) {
        let mut outbound = OutboundMessage::new(message);
        let mut inbound = InboundMessage::new();
        let mut carriers = 0;

        while !outbound.is_complete() {
            let mut headers = request_headers();
            outbound.fill(&mut headers).unwrap();
            carriers += 1;
            if let Some(received) = inbound.absorb(&headers) {
                assert!(outbound.is_complete());
                return (received, carriers);
            }
        }
        panic!("terminator never decoded");
    }

    #[test]
    fn message_round_trips_across_carriers() {
        // 19 letters per carrier.
        let (received, carriers) = relay(b"meet at dawn");
        assert_eq!(received, b"meet at dawn".to_vec());
        assert_eq!(carriers, 6);
    }

    #[test]
    fn utf8_message_round_trips() {
        let message = "déjà vu ✓".as_bytes();
        let (received, _) = relay(message);
        assert_eq!(String::from_utf8(received).unwrap(), "déjà vu ✓");
    }

    #[test]
    fn empty_message_sends_bare_terminator() {
        let (received, carriers) = relay(b"");
        assert!(received.is_empty());
        assert_eq!(carriers, 1);
    }

    #[test]
    fn exact_fit_needs_one_more_carrier() {
        // An 8-letter carrier takes the whole byte but has no room left for
        // the terminator.
        let mut outbound = OutboundMessage::new(b"z");
        let mut first: HeaderBlock = [HeaderField::new("Referrer", " /")].into_iter().collect();
        let encoded = outbound.fill(&mut first).unwrap();
        assert_eq!(encoded.bits_written, 8);
        assert!(!outbound.is_complete());
        assert_eq!(outbound.remaining_bits(), 0);

        let mut second = request_headers();
        let encoded = outbound.fill(&mut second).unwrap();
        assert_eq!(encoded.bits_written, 0);
        assert!(outbound.is_complete());

        let mut inbound = InboundMessage::new();
        assert_eq!(inbound.absorb(&first), None);
        assert_eq!(inbound.carriers(), 1);
        assert_eq!(inbound.absorb(&second), Some(b"z".to_vec()));
        assert_eq!(inbound.bits_received(), 0);
    }

    #[test]
    fn carrier_without_letters_is_rejected() {
        let mut outbound = OutboundMessage::new(b"a");
        let mut headers: HeaderBlock = [HeaderField::new("1-2", " x")].into_iter().collect();
        let err = outbound.fill(&mut headers).unwrap_err();
        assert_eq!(err, ProtocolError::NoCarrierCapacity { remaining: 8 });
    }

    #[test]
    fn fill_after_completion_leaves_carrier_alone() {
        let mut outbound = OutboundMessage::new(b"");
        let mut headers = request_headers();
        outbound.fill(&mut headers).unwrap();
        assert!(outbound.is_complete());

        let mut next = request_headers();
        outbound.fill(&mut next).unwrap();
        assert_eq!(next, request_headers());
    }
}
