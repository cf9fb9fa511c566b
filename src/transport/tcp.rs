//! TCP transport: socket setup for servers and clients.
//!
//! Streams are handed back already wrapped in the frame codec so callers
//! work in whole messages, never raw bytes.

use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{info, instrument};

use crate::core::codec::FrameCodec;
use crate::error::{ProtocolError, Result};

/// Bind the listening socket.
///
/// A port already in use surfaces as [`ProtocolError::Bind`], so startup
/// failure is an error the operator sees, not a crash.
#[instrument]
pub async fn listen(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ProtocolError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!(address = %addr, "Listening on tcp socket");
    Ok(listener)
}

/// Connect to a protocol server, wrapping the stream in the frame codec.
#[instrument]
pub async fn connect(addr: &str) -> Result<Framed<TcpStream, FrameCodec>> {
    let stream = TcpStream::connect(addr).await?;
    Ok(Framed::new(stream, FrameCodec::new()))
}
