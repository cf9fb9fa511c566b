//! Frame primitives for the circulation wire format.
//!
//! A frame is a single ASCII message:
//!
//! ```text
//! [Length(4 digits)] [Code(2)] [Fields(N)] [Seq(1 digit)] [Checksum(4 digits)] [CR]
//! ```
//!
//! The length prefix is the total frame length in decimal, including the
//! prefix itself and the trailing carriage return. Fields are `XY<value>|`
//! tag groups concatenated without separators (e.g. `AApatron123|`).
//!
//! This module is the pure half of the codec: it parses exactly one
//! complete frame and serializes one outbound message. Incremental
//! scanning over a byte stream lives in [`crate::core::codec`].

use crate::error::{ProtocolError, Result};

/// Width of the decimal length prefix.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Width of the transaction code.
pub const CODE_SIZE: usize = 2;

/// Width of the checksum field.
pub const CHECKSUM_SIZE: usize = 4;

/// Message delimiter (carriage return).
pub const TERMINATOR: u8 = b'\r';

/// Smallest parseable frame: length prefix, code, sequence digit,
/// checksum, and the terminator, with an empty fields payload.
pub const MIN_FRAME_SIZE: usize = LEN_PREFIX_SIZE + CODE_SIZE + 1 + CHECKSUM_SIZE + 1;

/// Largest encodable frame: the length prefix caps out at 4 digits.
pub const MAX_FRAME_SIZE: usize = 9999;

/// Additive checksum over `code + fields + sequence`: the sum of
/// character ordinals modulo 10000, zero-padded to four digits.
///
/// This is the simplified scheme the deployed terminals speak, not the
/// standard's bitwise two's-complement checksum.
pub fn additive_checksum(data: &str) -> String {
    let sum: u32 = data.chars().map(|c| (c as u32) % 10_000).sum::<u32>() % 10_000;
    format!("{sum:04}")
}

/// Parse the 4-digit decimal length prefix at the start of `bytes`.
pub fn parse_length_prefix(bytes: &[u8]) -> Result<usize> {
    let prefix = bytes
        .get(..LEN_PREFIX_SIZE)
        .ok_or(ProtocolError::FrameTooShort(bytes.len()))?;

    if !prefix.iter().all(u8::is_ascii_digit) {
        return Err(ProtocolError::InvalidLengthPrefix(
            String::from_utf8_lossy(prefix).into_owned(),
        ));
    }

    // All-digit ASCII, safe to parse
    let text = std::str::from_utf8(prefix).map_err(|_| ProtocolError::NonAsciiFrame)?;
    text.parse::<usize>()
        .map_err(|_| ProtocolError::InvalidLengthPrefix(text.to_string()))
}

/// One fully received inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    declared_len: usize,
    code: String,
    fields: String,
    sequence: char,
    checksum: String,
    raw: String,
}

impl ParsedFrame {
    /// Parse exactly one complete frame.
    ///
    /// `raw` must be the exact consumed span: the declared length has to
    /// match `raw.len()` and the frame has to end with the terminator.
    /// Checksum correctness is NOT required here; callers decide how to
    /// treat mismatches (see [`ParsedFrame::checksum_valid`]).
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.is_ascii() {
            return Err(ProtocolError::NonAsciiFrame);
        }
        if raw.len() < MIN_FRAME_SIZE {
            return Err(ProtocolError::FrameTooShort(raw.len()));
        }

        let declared_len = parse_length_prefix(raw.as_bytes())?;
        if declared_len != raw.len() {
            return Err(ProtocolError::LengthMismatch {
                declared: declared_len,
                actual: raw.len(),
            });
        }
        if raw.as_bytes()[raw.len() - 1] != TERMINATOR {
            return Err(ProtocolError::MissingTerminator);
        }

        // Everything between the length prefix and the terminator
        let body = &raw[LEN_PREFIX_SIZE..raw.len() - 1];
        let code = &body[..CODE_SIZE];
        let checksum = &body[body.len() - CHECKSUM_SIZE..];
        let sequence = body.as_bytes()[body.len() - CHECKSUM_SIZE - 1] as char;
        let fields = &body[CODE_SIZE..body.len() - CHECKSUM_SIZE - 1];

        Ok(Self {
            declared_len,
            code: code.to_string(),
            fields: fields.to_string(),
            sequence,
            checksum: checksum.to_string(),
            raw: raw.to_string(),
        })
    }

    /// Declared total length, equal to `self.raw().len()`.
    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    /// Two-character transaction code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Code-specific fields payload (tag groups).
    pub fn fields(&self) -> &str {
        &self.fields
    }

    /// The client's sequence digit, echoed back in responses.
    pub fn sequence(&self) -> char {
        self.sequence
    }

    /// The four-digit checksum as transmitted.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// The exact consumed wire text, terminator included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Recompute the additive checksum and compare with the transmitted one.
    pub fn checksum_valid(&self) -> bool {
        let mut data = String::with_capacity(self.code.len() + self.fields.len() + 1);
        data.push_str(&self.code);
        data.push_str(&self.fields);
        data.push(self.sequence);
        additive_checksum(&data) == self.checksum
    }

    /// Look up the value of a two-character field tag.
    ///
    /// Scans the `|`-terminated tag groups and returns the value of the
    /// first group starting with `tag`. Values containing the tag text
    /// inside them do not confuse the scan, unlike a raw substring split.
    pub fn field(&self, tag: &str) -> Option<&str> {
        self.fields
            .split('|')
            .find(|group| group.len() >= tag.len() && group.starts_with(tag))
            .map(|group| &group[tag.len()..])
    }
}

/// A response message awaiting serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub code: String,
    pub fields: String,
    pub sequence: char,
}

impl OutboundMessage {
    pub fn new(code: impl Into<String>, fields: impl Into<String>, sequence: char) -> Self {
        Self {
            code: code.into(),
            fields: fields.into(),
            sequence,
        }
    }

    /// Serialize to the wire text, length prefix and terminator included.
    ///
    /// Deterministic: identical inputs always yield identical output.
    pub fn encode(&self) -> Result<String> {
        let mut body = String::with_capacity(self.code.len() + self.fields.len() + 1);
        body.push_str(&self.code);
        body.push_str(&self.fields);
        body.push(self.sequence);

        let checksum = additive_checksum(&body);
        let total = LEN_PREFIX_SIZE + body.len() + CHECKSUM_SIZE + 1;
        if total > MAX_FRAME_SIZE {
            return Err(ProtocolError::OversizedFrame(total));
        }

        Ok(format!("{total:04}{body}{checksum}\r"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn checksum_known_value() {
        // '9' + '3' + '1' = 57 + 51 + 49 = 157
        assert_eq!(additive_checksum("931"), "0157");
    }

    #[test]
    fn checksum_wraps_modulo_10000() {
        let data = "z".repeat(100); // 100 * 122 = 12200
        assert_eq!(additive_checksum(&data), "2200");
    }

    #[test]
    fn encode_login_response() {
        let msg = OutboundMessage::new("94", "1", '4');
        let wire = msg.encode().unwrap();
        assert!(wire.starts_with("0013"));
        assert!(wire.ends_with('\r'));
        assert_eq!(wire.len(), 13);
        assert_eq!(&wire[4..6], "94");
    }

    #[test]
    fn encode_is_deterministic() {
        let msg = OutboundMessage::new("24", "100NIName, My Patron|AA12345|", '7');
        assert_eq!(msg.encode().unwrap(), msg.encode().unwrap());
    }

    #[test]
    fn parse_recovers_encoded_message() {
        let msg = OutboundMessage::new("12", "1", '9');
        let wire = msg.encode().unwrap();
        let frame = ParsedFrame::parse(&wire).unwrap();
        assert_eq!(frame.code(), "12");
        assert_eq!(frame.fields(), "1");
        assert_eq!(frame.sequence(), '9');
        assert!(frame.checksum_valid());
        assert_eq!(frame.raw(), wire);
        assert_eq!(frame.declared_len(), wire.len());
    }

    #[test]
    fn parse_rejects_bad_length_prefix() {
        let err = ParsedFrame::parse("ABCD931XXXX\r\r").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidLengthPrefix(_)));
    }

    #[test]
    fn parse_rejects_short_frame() {
        let err = ParsedFrame::parse("0005\r").unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooShort(5)));
    }

    #[test]
    fn parse_rejects_length_mismatch() {
        // Declares 20 but is only 13 bytes long
        let err = ParsedFrame::parse("0020941YYYY\r\r").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::LengthMismatch {
                declared: 20,
                actual: 13
            }
        ));
    }

    #[test]
    fn checksum_mismatch_is_reported_not_rejected() {
        let wire = "001394149999\r";
        let frame = ParsedFrame::parse(wire).unwrap();
        assert_eq!(frame.code(), "94");
        assert!(!frame.checksum_valid());
    }

    #[test]
    fn field_lookup_is_tag_aware() {
        let msg = OutboundMessage::new("23", "BXAAnot-an-id|AA12345|ABitem9|", '0');
        let frame = ParsedFrame::parse(&msg.encode().unwrap()).unwrap();
        // The AA inside the BX value must not win over the real AA group
        assert_eq!(frame.field("AA"), Some("12345"));
        assert_eq!(frame.field("AB"), Some("item9"));
        assert_eq!(frame.field("ZZ"), None);
    }
}
