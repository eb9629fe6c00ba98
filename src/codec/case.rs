//! Letter-case encoding of header field names.
//!
//! Every ASCII letter of a field name carries one bit: uppercase is `1`,
//! lowercase is `0`. Other characters are never touched and carry nothing.
//! The end of a hidden message is marked by appending [`TERMINATOR`] to the
//! value of the header where the encoder ran out of bits.
//!
//! When the bits run out part way through a name, the unused letters of that
//! name are set to the opposite case of the last bit written. The decoder
//! recognizes that trailing run as padding. A terminator on a header that
//! carries no bits has an all-lowercase name, so the whole name is padding.

use crate::codec::bitstream::Bitstream;
use crate::http::headers::{HeaderBlock, HeaderField};

/// Value suffix marking the end of a hidden message.
pub const TERMINATOR: &str = "  ";

/// Result of one [`encode`] pass over a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    /// Bits moved from the stream into letter casing.
    pub bits_written: usize,
    /// The terminator was appended somewhere in this block.
    pub terminated: bool,
}

/// Result of one [`decode`] pass over a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// No terminator yet; more blocks are needed.
    Pending { bits_read: usize },
    /// Terminator found. The last `padding` bits appended are filler.
    Complete { bits_read: usize, padding: usize },
}

impl Decoded {
    pub fn is_complete(&self) -> bool {
        matches!(self, Decoded::Complete { .. })
    }

    pub fn bits_read(&self) -> usize {
        match *self {
            Decoded::Pending { bits_read } | Decoded::Complete { bits_read, .. } => bits_read,
        }
    }
}

/// Rewrite name casing from `bits`, consuming them from the tail.
///
/// Headers keep their order, names keep their letters, values are untouched
/// except for the header that receives the terminator. Once the terminator is
/// placed, later headers are left alone. An empty stream leaves the block
/// unchanged. If the stream drains exactly at the end of the block, no
/// terminator is placed and the next block must carry it.
pub fn encode(headers: &mut HeaderBlock, bits: &mut Bitstream) -> Encoded {
    let mut bits_written = 0;
    if bits.is_empty() {
        return Encoded {
            bits_written,
            terminated: false,
        };
    }

    for field in headers.iter_mut() {
        if bits.is_empty() {
            mark_terminal(field);
            return Encoded {
                bits_written,
                terminated: true,
            };
        }

        let (written, drained_mid_name) = encode_name(&mut field.name, bits);
        bits_written += written;
        if drained_mid_name {
            field.value.push_str(TERMINATOR);
            return Encoded {
                bits_written,
                terminated: true,
            };
        }
    }

    Encoded {
        bits_written,
        terminated: false,
    }
}

/// Place a terminator carrying zero bits on the first header.
///
/// Used when a stream drained exactly at the end of the previous block, or
/// when the hidden message is empty.
pub fn terminate(headers: &mut HeaderBlock) -> Encoded {
    let terminated = match headers.iter_mut().next() {
        Some(field) => {
            mark_terminal(field);
            true
        }
        None => false,
    };
    Encoded {
        bits_written: 0,
        terminated,
    }
}

/// Append one bit per name letter to `bits`, stopping after the header that
/// carries the terminator.
pub fn decode(headers: &HeaderBlock, bits: &mut Bitstream) -> Decoded {
    let mut bits_read = 0;

    for field in headers {
        for c in field.name.chars().filter(char::is_ascii_alphabetic) {
            bits.push(c.is_ascii_uppercase());
            bits_read += 1;
        }

        if field.value.ends_with(TERMINATOR) {
            return Decoded::Complete {
                bits_read,
                padding: trailing_run(&field.name),
            };
        }
    }

    Decoded::Pending { bits_read }
}

/// Turn a completed inbound stream back into message bytes.
///
/// Drops `padding` bits when that leaves whole bytes, otherwise falls back to
/// dropping the trailing partial byte. Then undoes the stack ordering.
pub fn recover_message(mut bits: Bitstream, padding: usize) -> Vec<u8> {
    let len = bits.len();
    if padding <= len && (len - padding) % 8 == 0 {
        bits.truncate(len - padding);
    } else {
        bits.truncate_to_byte_boundary();
    }
    bits.reverse();
    bits.to_bytes()
}

fn mark_terminal(field: &mut HeaderField) {
    field.name.make_ascii_lowercase();
    field.value.push_str(TERMINATOR);
}

/// Returns the number of bits written and whether the stream ran dry before
/// the last letter.
fn encode_name(name: &mut String, bits: &mut Bitstream) -> (usize, bool) {
    let mut written = 0;
    let mut last = false;
    let mut padding: Option<bool> = None;
    let mut rewritten = String::with_capacity(name.len());

    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            rewritten.push(c);
            continue;
        }

        let upper = match padding {
            Some(upper) => upper,
            None => match bits.pop() {
                Some(bit) => {
                    written += 1;
                    last = bit;
                    bit
                }
                None => {
                    padding = Some(!last);
                    !last
                }
            },
        };

        rewritten.push(if upper {
            c.to_ascii_uppercase()
        } else {
            c.to_ascii_lowercase()
        });
    }

    *name = rewritten;
    (written, padding.is_some())
}

/// Length of the run of same-case letters at the end of `name`.
fn trailing_run(name: &str) -> usize {
    let mut cases = name
        .chars()
        .rev()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.is_ascii_uppercase());

    match cases.next() {
        Some(first) => 1 + cases.take_while(|&upper| upper == first).count(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(fields: &[(&str, &str)]) -> HeaderBlock {
        fields
            .iter()
            .map(|(name, value)| HeaderField::new(*name, *value))
            .collect()
    }

    fn names(headers: &HeaderBlock) -> Vec<String> {
        headers.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn single_byte_into_content_type() {
        let mut headers = block(&[("content-type", " text/html")]);
        let mut bits = Bitstream::from_bytes(b"x");

        let encoded = encode(&mut headers, &mut bits);
        assert_eq!(
            encoded,
            Encoded {
                bits_written: 8,
                terminated: true
            }
        );
        assert!(bits.is_empty());

        // 'x' = 0111_1000, popped LSB first: 0,0,0,1,1,1,1,0. The ninth pop
        // fails on 'y', the last bit was 0, so "ype" is padded uppercase.
        let field = headers.iter().next().unwrap();
        assert_eq!(field.name, "conTENT-tYPE");
        assert_eq!(field.value, " text/html  ");

        let mut inbound = Bitstream::new();
        let decoded = decode(&headers, &mut inbound);
        assert_eq!(
            decoded,
            Decoded::Complete {
                bits_read: 11,
                padding: 3
            }
        );
        assert_eq!(recover_message(inbound, 3), b"x".to_vec());
    }

    #[test]
    fn message_spanning_two_blocks() {
        let mut first = block(&[("Host", " example.com")]);
        let mut second = block(&[("User-Agent", " test"), ("Accept", " */*"), ("Connection", " close")]);
        let mut bits = Bitstream::from_bytes(b"hi");

        let encoded = encode(&mut first, &mut bits);
        assert_eq!(encoded.bits_written, 4);
        assert!(!encoded.terminated);
        assert_eq!(bits.len(), 12);

        let encoded = encode(&mut second, &mut bits);
        assert_eq!(encoded.bits_written, 12);
        assert!(encoded.terminated);

        let fields: Vec<_> = second.iter().collect();
        assert!(fields[1].value.ends_with(TERMINATOR));
        assert_eq!(fields[2].name, "Connection");
        assert_eq!(fields[2].value, " close");

        let mut inbound = Bitstream::new();
        assert!(!decode(&first, &mut inbound).is_complete());
        let decoded = decode(&second, &mut inbound);
        let Decoded::Complete { padding, .. } = decoded else {
            panic!("expected terminator, got {decoded:?}");
        };
        assert_eq!(recover_message(inbound, padding), b"hi".to_vec());
    }

    #[test]
    fn long_padding_is_not_decoded_as_data() {
        // 23 letters carrying 8 bits: a plain byte trim would keep 16 bits.
        let mut headers = block(&[("Strict-Transport-Security", " max-age=60")]);
        let mut bits = Bitstream::from_bytes(b"x");

        let encoded = encode(&mut headers, &mut bits);
        assert!(encoded.terminated);
        assert_eq!(encoded.bits_written, 8);

        let mut inbound = Bitstream::new();
        let Decoded::Complete { bits_read, padding } = decode(&headers, &mut inbound) else {
            panic!("expected terminator");
        };
        assert_eq!(bits_read, 23);
        assert_eq!(padding, 15);
        assert_eq!(recover_message(inbound, padding), b"x".to_vec());
    }

    #[test]
    fn drained_at_header_boundary_terminates_on_next_header() {
        let mut headers = block(&[("Referrer", " /"), ("Accept-Language", " en")]);
        let mut bits = Bitstream::from_bytes(b"A");

        let encoded = encode(&mut headers, &mut bits);
        assert_eq!(encoded.bits_written, 8);
        assert!(encoded.terminated);

        let fields: Vec<_> = headers.iter().collect();
        assert!(!fields[0].value.ends_with(TERMINATOR));
        assert_eq!(fields[1].name, "accept-language");
        assert_eq!(fields[1].value, " en  ");

        let mut inbound = Bitstream::new();
        let Decoded::Complete { padding, .. } = decode(&headers, &mut inbound) else {
            panic!("expected terminator");
        };
        assert_eq!(padding, 14);
        assert_eq!(recover_message(inbound, padding), b"A".to_vec());
    }

    #[test]
    fn drained_at_block_end_leaves_terminator_owed() {
        let mut headers = block(&[("Referrer", " /")]);
        let mut bits = Bitstream::from_bytes(b"A");

        let encoded = encode(&mut headers, &mut bits);
        assert_eq!(
            encoded,
            Encoded {
                bits_written: 8,
                terminated: false
            }
        );

        let mut next = block(&[("Host", " example.com")]);
        assert!(terminate(&mut next).terminated);

        let mut inbound = Bitstream::new();
        assert!(!decode(&headers, &mut inbound).is_complete());
        let Decoded::Complete { padding, .. } = decode(&next, &mut inbound) else {
            panic!("expected terminator");
        };
        assert_eq!(recover_message(inbound, padding), b"A".to_vec());
    }

    #[test]
    fn empty_stream_leaves_block_unchanged() {
        let original = block(&[("Content-Type", " text/plain"), ("Host", " a")]);
        let mut headers = original.clone();
        let mut bits = Bitstream::new();

        let encoded = encode(&mut headers, &mut bits);
        assert_eq!(
            encoded,
            Encoded {
                bits_written: 0,
                terminated: false
            }
        );
        assert_eq!(headers, original);

        let mut inbound = Bitstream::new();
        assert!(!decode(&headers, &mut inbound).is_complete());
    }

    #[test]
    fn non_letters_are_untouched_and_carry_nothing() {
        let mut headers = block(&[("X-1-2", " v"), ("3-Y", " w")]);
        let mut bits = Bitstream::from_bytes(&[0b0000_0011]);

        let encoded = encode(&mut headers, &mut bits);
        assert_eq!(encoded.bits_written, 2);
        assert_eq!(names(&headers), vec!["X-1-2".to_string(), "3-Y".to_string()]);

        let mut inbound = Bitstream::new();
        let decoded = decode(&headers, &mut inbound);
        assert_eq!(decoded.bits_read(), 2);
    }

    #[test]
    fn encoding_only_changes_case() {
        let original = block(&[
            ("Host", " example.com"),
            ("User-Agent", " Mozilla/5.0"),
            ("Accept-Encoding", " gzip"),
            ("X-Request-Id", " 42"),
        ]);
        let mut headers = original.clone();
        let mut bits = Bitstream::from_bytes(b"covert");

        let encoded = encode(&mut headers, &mut bits);
        assert!(!encoded.terminated);
        assert_eq!(headers.len(), original.len());
        for (after, before) in headers.iter().zip(original.iter()) {
            assert_eq!(after.name.len(), before.name.len());
            assert!(after.name.eq_ignore_ascii_case(&before.name));
            assert_eq!(after.value, before.value);
        }
    }

    #[test]
    fn decode_ignores_headers_after_terminator() {
        let headers = block(&[("AB", " x  "), ("CDEF", " y")]);
        let mut inbound = Bitstream::new();
        let decoded = decode(&headers, &mut inbound);
        assert_eq!(
            decoded,
            Decoded::Complete {
                bits_read: 2,
                padding: 2
            }
        );
        assert_eq!(inbound.len(), 2);
    }

    #[test]
    fn terminate_without_headers_is_a_no_op() {
        let mut headers = HeaderBlock::new();
        assert!(!terminate(&mut headers).terminated);
    }

    #[test]
    fn misaligned_padding_falls_back_to_byte_trim() {
        // Carrier produced by an encoder that leaves unused letters as-is.
        let mut inbound: Bitstream = [false, false, false, true, true, true, true, false]
            .into_iter()
            .collect();
        inbound.push(false);
        inbound.push(true);
        assert_eq!(recover_message(inbound, 1), b"x".to_vec());
    }
}
