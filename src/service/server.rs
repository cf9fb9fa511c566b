//! Listener lifecycle: bind, accept, spawn sessions, shut down.
//!
//! Each accepted connection gets its own tokio task so a slow or
//! misbehaving client never blocks the accept loop or other sessions.
//! Shutdown is cooperative: a message on the shutdown channel stops
//! accepting immediately and waits up to the configured timeout for
//! active sessions to drain.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ProtocolConfig, ServerConfig};
use crate::core::codec::FrameCodec;
use crate::error::Result;
use crate::protocol::dispatcher::Dispatcher;
use crate::service::session::{ResponseSequence, Session};
use crate::transport::tcp;
use crate::utils::metrics::global_metrics;

/// Start a server on the configured address, shutting down on ctrl-c.
#[instrument(skip(server, protocol), fields(address = %server.address))]
pub async fn start_server(server: &ServerConfig, protocol: &ProtocolConfig) -> Result<()> {
    // Create internal shutdown channel
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    // Set up ctrl-c handler that sends to our internal shutdown channel
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received CTRL+C signal, shutting down");
            let _ = shutdown_tx_clone.send(()).await;
        }
    });

    start_server_with_shutdown(server, protocol, shutdown_rx).await
}

/// Start a server with an external shutdown channel.
#[instrument(skip(server, protocol, shutdown_rx), fields(address = %server.address))]
pub async fn start_server_with_shutdown(
    server: &ServerConfig,
    protocol: &ProtocolConfig,
    shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let listener = tcp::listen(&server.address).await?;
    serve(listener, server, protocol, shutdown_rx).await
}

/// Accept loop over an already-bound listener.
///
/// Split out from [`start_server_with_shutdown`] so callers (and tests)
/// can bind to an ephemeral port and learn the address before serving.
pub async fn serve(
    listener: TcpListener,
    server: &ServerConfig,
    protocol: &ProtocolConfig,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::with_builtin_handlers()?);
    let sequence = Arc::new(ResponseSequence::new());
    let codec = FrameCodec::with_policy(protocol.strict_checksums, protocol.max_pending_bytes);

    // Track active connections
    let active_connections = Arc::new(Mutex::new(0u32));

    // Server main loop with graceful shutdown
    loop {
        tokio::select! {
            // Check for shutdown signal from the provided shutdown_rx channel
            _ = shutdown_rx.recv() => {
                info!("Shutting down server. Waiting for sessions to close...");

                // Wait for active sessions to close (with timeout)
                let timeout = tokio::time::sleep(server.shutdown_timeout);
                tokio::pin!(timeout);

                loop {
                    tokio::select! {
                        _ = &mut timeout => {
                            warn!("Shutdown timeout reached, forcing exit");
                            break;
                        }
                        _ = tokio::time::sleep(Duration::from_millis(500)) => {
                            let connections = *active_connections.lock().await;
                            info!(connections = %connections, "Waiting for sessions to close");
                            if connections == 0 {
                                info!("All sessions closed, shutting down");
                                break;
                            }
                        }
                    }
                }

                global_metrics().log_metrics();
                return Ok(());
            }

            // Accept new connections
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        {
                            let mut count = active_connections.lock().await;
                            if (*count as usize) >= server.max_connections {
                                warn!(
                                    peer = %peer,
                                    limit = server.max_connections,
                                    "connection limit reached, refusing client"
                                );
                                global_metrics().connection_error();
                                continue;
                            }
                            *count += 1;
                        }

                        global_metrics().connection_established();
                        info!(peer = %peer, "New connection established");

                        let active_connections = active_connections.clone();
                        let session = Session::new(
                            stream,
                            peer,
                            codec.clone(),
                            dispatcher.clone(),
                            sequence.clone(),
                        );

                        tokio::spawn(async move {
                            if let Err(e) = session.run().await {
                                debug!(peer = %peer, error = %e, "session ended with error");
                            }

                            // Release the connection slot when the session ends
                            let mut count = active_connections.lock().await;
                            *count -= 1;
                            global_metrics().connection_closed();
                            info!(peer = %peer, "Connection closed");
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Error accepting connection");
                    }
                }
            }
        }
    }
}
