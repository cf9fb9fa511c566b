//! Per-connection session handling.
//!
//! A [`Session`] owns one accepted connection: its framed stream (and so
//! the receive buffer inside it), the peer address, and handles to the
//! shared dispatcher and response counter. No other task ever touches a
//! session's buffer; exclusivity comes from ownership, not locking.
//!
//! The loop alternates between waiting for bytes and draining whatever
//! complete frames the codec can produce from them. Each response is
//! written before the next inbound frame is decoded, so responses on one
//! connection never reorder.

use futures::{SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, instrument, trace, warn};

use crate::core::codec::FrameCodec;
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::message::Transaction;
use crate::utils::metrics::global_metrics;

/// Process-wide response sequence counter, advanced modulo 10 on every
/// outbound message.
///
/// Diagnostic only: responses correlate by echoing the client's own
/// sequence digit, never this value. The atomic keeps concurrent
/// sessions from losing increments.
#[derive(Debug, Default)]
pub struct ResponseSequence(AtomicU8);

impl ResponseSequence {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Advance the counter and return the new value (0-9).
    pub fn advance(&self) -> u8 {
        let prev = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some((n + 1) % 10))
            .unwrap_or_default();
        (prev + 1) % 10
    }

    /// Current counter value (0-9).
    pub fn current(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }
}

/// One accepted connection's processing loop and state.
pub struct Session {
    framed: Framed<TcpStream, FrameCodec>,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    sequence: Arc<ResponseSequence>,
}

impl Session {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        codec: FrameCodec,
        dispatcher: Arc<Dispatcher>,
        sequence: Arc<ResponseSequence>,
    ) -> Self {
        Self {
            framed: Framed::new(stream, codec),
            peer,
            dispatcher,
            sequence,
        }
    }

    /// Drive the session until the client disconnects or the stream fails.
    ///
    /// Malformed input never ends the session (the codec resynchronizes
    /// internally); only socket failures and a runaway receive buffer do.
    #[instrument(skip(self), fields(peer = %self.peer))]
    pub async fn run(mut self) -> Result<()> {
        debug!("session established");

        while let Some(next) = self.framed.next().await {
            let frame = match next {
                Ok(frame) => frame,
                Err(ProtocolError::Io(ref e)) if is_disconnect(e.kind()) => {
                    debug!(error = %e, "client connection dropped");
                    return Ok(());
                }
                Err(e) => {
                    global_metrics().connection_error();
                    warn!(error = %e, "terminating session");
                    return Err(e);
                }
            };

            trace!(raw = %frame.raw().trim_end_matches('\r'), "frame received");

            let response = match self.dispatcher.dispatch(&frame) {
                Ok(Some(response)) => response,
                Ok(None) => {
                    global_metrics().unknown_transaction();
                    warn!(code = %frame.code(), "unsupported transaction code, no response sent");
                    continue;
                }
                Err(e) => {
                    warn!(code = %frame.code(), error = %e, "handler failed, no response sent");
                    continue;
                }
            };

            if let Some(transaction) = Transaction::from_request_code(frame.code()) {
                debug!(
                    transaction = transaction.name(),
                    sequence = %frame.sequence(),
                    "transaction handled"
                );
            }

            let server_sequence = self.sequence.advance();
            trace!(response_counter = server_sequence, "response counter advanced");

            if let Err(e) = self.framed.send(response).await {
                return match e {
                    ProtocolError::Io(ref io_err) if is_disconnect(io_err.kind()) => {
                        debug!(
                            error = %io_err,
                            "client disconnected before response could be sent"
                        );
                        Ok(())
                    }
                    other => {
                        global_metrics().connection_error();
                        warn!(error = %other, "failed to write response");
                        Err(other)
                    }
                };
            }
        }

        debug!("client disconnected");
        Ok(())
    }
}

fn is_disconnect(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn response_sequence_cycles_modulo_ten() {
        let sequence = ResponseSequence::new();
        let values: Vec<u8> = (0..12).map(|_| sequence.advance()).collect();
        assert_eq!(values[..10], [1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        assert_eq!(values[10], 1);
        assert_eq!(sequence.current(), 2);
    }

    #[test]
    fn concurrent_advances_lose_no_increments() {
        let sequence = Arc::new(ResponseSequence::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let sequence = sequence.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..250 {
                    sequence.advance();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        // 1000 increments wrap back to the starting value
        assert_eq!(sequence.current(), 0);
    }
}
