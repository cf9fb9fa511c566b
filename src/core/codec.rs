//! Incremental frame codec for streamed connections.
//!
//! [`FrameCodec`] implements [`tokio_util::codec::Decoder`] and
//! [`Encoder`] so a connection can be wrapped in a
//! [`Framed`](tokio_util::codec::Framed) stream of [`ParsedFrame`]s.
//!
//! The decoder scans the growing receive buffer for the carriage-return
//! delimiter and checks the declared length against it:
//!
//! - no delimiter yet: nothing is consumed, more bytes are awaited
//! - delimiter found but fewer bytes buffered than declared: the frame
//!   body has not fully arrived, the buffer is retained as-is
//! - bad length prefix, or a declared length that disagrees with the
//!   delimiter: the span up to and including the delimiter is dropped
//!   and scanning continues (protocol resync), so one garbled message
//!   can never wedge a connection
//! - otherwise exactly `declared` bytes are consumed and split into a
//!   frame
//!
//! Checksum mismatches are counted and logged but accepted by default;
//! strict mode drops the frame instead. A buffer cap bounds memory for
//! peers that never send a delimiter (a compliant frame is at most 9999
//! bytes by construction).

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::core::frame::{parse_length_prefix, OutboundMessage, ParsedFrame, TERMINATOR};
use crate::error::ProtocolError;
use crate::utils::metrics::global_metrics;

/// Default cap on buffered bytes while waiting for a delimiter.
pub const DEFAULT_MAX_PENDING_BYTES: usize = 16 * 1024;

/// Streaming codec for the circulation wire format.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    strict_checksums: bool,
    max_pending_bytes: usize,
}

impl FrameCodec {
    /// Codec with the lenient default policy: checksum mismatches are
    /// logged and accepted.
    pub fn new() -> Self {
        Self {
            strict_checksums: false,
            max_pending_bytes: DEFAULT_MAX_PENDING_BYTES,
        }
    }

    /// Codec with an explicit checksum policy and buffer cap.
    pub fn with_policy(strict_checksums: bool, max_pending_bytes: usize) -> Self {
        Self {
            strict_checksums,
            max_pending_bytes,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = ParsedFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<ParsedFrame>, ProtocolError> {
        loop {
            let Some(cr) = src.iter().position(|&b| b == TERMINATOR) else {
                if src.len() > self.max_pending_bytes {
                    return Err(ProtocolError::RunawayBuffer(src.len()));
                }
                return Ok(None);
            };
            let delimited = cr + 1;

            let declared = match parse_length_prefix(&src[..]) {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, skipped = delimited, "bad length prefix, resyncing");
                    global_metrics().frame_malformed();
                    src.advance(delimited);
                    continue;
                }
            };

            if declared > src.len() {
                // Length prefix read but the body has not fully arrived
                return Ok(None);
            }

            if declared != delimited {
                warn!(
                    declared,
                    delimiter = delimited,
                    "declared length disagrees with delimiter, resyncing"
                );
                global_metrics().frame_malformed();
                src.advance(delimited);
                continue;
            }

            let raw = src.split_to(declared);
            let text = match std::str::from_utf8(&raw) {
                Ok(text) => text,
                Err(_) => {
                    warn!(len = declared, "frame is not valid ASCII, dropping");
                    global_metrics().frame_malformed();
                    continue;
                }
            };

            let frame = match ParsedFrame::parse(text) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, raw = %text.trim_end(), "unparseable frame, dropping");
                    global_metrics().frame_malformed();
                    continue;
                }
            };

            if !frame.checksum_valid() {
                global_metrics().checksum_mismatch();
                if self.strict_checksums {
                    warn!(
                        code = %frame.code(),
                        transmitted = %frame.checksum(),
                        "checksum mismatch, dropping frame (strict mode)"
                    );
                    continue;
                }
                warn!(
                    code = %frame.code(),
                    transmitted = %frame.checksum(),
                    "checksum mismatch, accepting frame"
                );
            }

            global_metrics().message_received(frame.declared_len() as u64);
            return Ok(Some(frame));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<ParsedFrame>, ProtocolError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !src.is_empty() {
                    debug!(leftover = src.len(), "discarding unterminated bytes at EOF");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<OutboundMessage> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: OutboundMessage, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let wire = item.encode()?;
        dst.reserve(wire.len());
        dst.extend_from_slice(wire.as_bytes());
        global_metrics().message_sent(wire.len() as u64);
        Ok(())
    }
}
