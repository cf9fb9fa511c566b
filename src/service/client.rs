//! Client for the circulation protocol.
//!
//! Handles sequence-digit cycling and the request/response exchange for
//! the four supported transactions. Useful for terminal emulation,
//! integration tests, and smoke-testing a deployed server.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::core::codec::FrameCodec;
use crate::core::frame::{OutboundMessage, ParsedFrame};
use crate::error::{ProtocolError, Result};
use crate::protocol::message::{codes, tags};
use crate::transport::tcp;

/// A connected protocol client.
pub struct CircClient {
    framed: Framed<TcpStream, FrameCodec>,
    config: ClientConfig,
    sequence: u8,
}

impl CircClient {
    /// Connect with default timeouts.
    #[instrument]
    pub async fn connect(addr: &str) -> Result<Self> {
        let config = ClientConfig {
            address: addr.to_string(),
            ..ClientConfig::default()
        };
        Self::connect_with_config(config).await
    }

    /// Connect with explicit client configuration.
    #[instrument(skip(config), fields(addr = %config.address))]
    pub async fn connect_with_config(config: ClientConfig) -> Result<Self> {
        let framed = timeout(config.connect_timeout, tcp::connect(&config.address))
            .await
            .map_err(|_| {
                ProtocolError::Custom(format!("connect to {} timed out", config.address))
            })??;
        debug!("connected");

        Ok(Self {
            framed,
            config,
            sequence: 0,
        })
    }

    /// Send one transaction and wait for the matching response.
    ///
    /// The sequence digit cycles 0-9 per request; the server echoes it
    /// back, which is what responses are correlated on.
    pub async fn request(&mut self, code: &str, fields: &str) -> Result<ParsedFrame> {
        self.sequence = (self.sequence + 1) % 10;
        let sequence = char::from(b'0' + self.sequence);
        let message = OutboundMessage::new(code, fields, sequence);

        self.framed.send(message).await?;

        let response = timeout(self.config.response_timeout, self.framed.next())
            .await
            .map_err(|_| ProtocolError::Custom("timed out waiting for response".to_string()))?;

        match response {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(e)) => Err(e),
            None => Err(ProtocolError::ConnectionClosed),
        }
    }

    /// Login (93) with terminal credentials.
    pub async fn login(&mut self, user: &str, password: &str) -> Result<ParsedFrame> {
        let fields = format!(
            "{user_tag}{user}|{pass_tag}{password}|",
            user_tag = tags::LOGIN_USER_ID,
            pass_tag = tags::LOGIN_PASSWORD,
        );
        self.request(codes::LOGIN_REQUEST, &fields).await
    }

    /// Checkout (11) of an item to a patron.
    pub async fn checkout(&mut self, patron_id: &str, item_id: &str) -> Result<ParsedFrame> {
        let fields = format!(
            "{patron_tag}{patron_id}|{item_tag}{item_id}|",
            patron_tag = tags::PATRON_IDENTIFIER,
            item_tag = tags::ITEM_IDENTIFIER,
        );
        self.request(codes::CHECKOUT_REQUEST, &fields).await
    }

    /// Checkin (09) of a returned item.
    pub async fn checkin(&mut self, item_id: &str) -> Result<ParsedFrame> {
        let fields = format!("{item_tag}{item_id}|", item_tag = tags::ITEM_IDENTIFIER);
        self.request(codes::CHECKIN_REQUEST, &fields).await
    }

    /// Patron status request (23).
    pub async fn patron_status(&mut self, patron_id: &str) -> Result<ParsedFrame> {
        let fields = format!(
            "{patron_tag}{patron_id}|",
            patron_tag = tags::PATRON_IDENTIFIER,
        );
        self.request(codes::PATRON_STATUS_REQUEST, &fields).await
    }

    /// The sequence digit that will accompany the next request.
    pub fn next_sequence(&self) -> u8 {
        (self.sequence + 1) % 10
    }
}
