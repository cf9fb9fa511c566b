use crate::core::frame::{OutboundMessage, ParsedFrame};
use crate::error::{ProtocolError, Result};
use crate::protocol::message::{codes, tags, Transaction};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type HandlerFn = dyn Fn(&ParsedFrame) -> Result<OutboundMessage> + Send + Sync + 'static;

/// Success flag carried by login/checkout/checkin responses.
const SUCCESS_FLAG: &str = "1";

/// Fixed display name returned in patron status responses.
const PATRON_DISPLAY_NAME: &str = "Name, My Patron";

/// Fixed leading status portion of the patron status response payload.
const PATRON_STATUS_PREFIX: &str = "100";

/// Transaction dispatcher mapping inbound frames to response messages.
///
/// Handlers are registered per transaction code. The built-in set covers
/// the four supported circulation transactions; embedders can register
/// additional codes or override a built-in policy. Uses Cow<'static, str>
/// keys to avoid heap allocations for the static code table.
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<Cow<'static, str>, Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// An empty dispatcher with no handlers registered.
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A dispatcher pre-populated with the built-in circulation
    /// transactions: login, checkout, checkin, and patron status.
    pub fn with_builtin_handlers() -> Result<Self> {
        let dispatcher = Self::new();
        for transaction in Transaction::ALL {
            match transaction {
                Transaction::PatronStatus => {
                    dispatcher.register(transaction.request_code(), patron_status_response)?;
                }
                _ => {
                    let response_code = transaction.response_code();
                    dispatcher.register(transaction.request_code(), move |frame| {
                        Ok(OutboundMessage::new(
                            response_code,
                            SUCCESS_FLAG,
                            frame.sequence(),
                        ))
                    })?;
                }
            }
        }
        Ok(dispatcher)
    }

    pub fn register<F>(&self, code: &str, handler: F) -> Result<()>
    where
        F: Fn(&ParsedFrame) -> Result<OutboundMessage> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().map_err(|_| {
            ProtocolError::Custom("Failed to acquire write lock on dispatcher".to_string())
        })?;

        handlers.insert(Cow::Owned(code.to_string()), Box::new(handler));
        Ok(())
    }

    /// Map an inbound frame to its response message.
    ///
    /// Returns `Ok(None)` for transaction codes with no registered
    /// handler: unsupported transactions get protocol-level silence, not
    /// an error response.
    pub fn dispatch(&self, frame: &ParsedFrame) -> Result<Option<OutboundMessage>> {
        let handlers = self.handlers.read().map_err(|_| {
            ProtocolError::Custom("Failed to acquire read lock on dispatcher".to_string())
        })?;

        match handlers.get(frame.code()) {
            Some(handler) => handler(frame).map(Some),
            None => {
                debug!(code = %frame.code(), "no handler registered for transaction code");
                Ok(None)
            }
        }
    }
}

/// Patron status response: the patron identifier from the request's `AA`
/// group, echoed behind a fixed status prefix and display name field.
fn patron_status_response(frame: &ParsedFrame) -> Result<OutboundMessage> {
    let patron_id = frame.field(tags::PATRON_IDENTIFIER).unwrap_or_default();
    let fields = format!(
        "{PATRON_STATUS_PREFIX}{name_tag}{PATRON_DISPLAY_NAME}|{id_tag}{patron_id}|",
        name_tag = tags::PERSONAL_NAME,
        id_tag = tags::PATRON_IDENTIFIER,
    );
    Ok(OutboundMessage::new(
        codes::PATRON_STATUS_RESPONSE,
        fields,
        frame.sequence(),
    ))
}
