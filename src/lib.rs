//! # circ-protocol
//!
//! Wire protocol core for library circulation services: a text-based,
//! length-prefixed request/response engine for patron and circulation
//! transactions over persistent TCP connections.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 Listener / Server                    │
//! │        (accept loop, one task per connection)        │
//! └───────────────────────┬──────────────────────────────┘
//!                         │
//! ┌───────────────────────▼──────────────────────────────┐
//! │                     Session                          │
//! │     (per-connection buffer, in-order responses)      │
//! └───────────┬──────────────────────────┬───────────────┘
//!             │                          │
//!             ▼                          ▼
//!     ┌──────────────┐          ┌─────────────────┐
//!     │  FrameCodec  │          │   Dispatcher    │
//!     │ (parse/emit) │          │ (code → policy) │
//!     └──────────────┘          └─────────────────┘
//! ```
//!
//! ## Wire Format
//!
//! ```text
//! [Length(4 digits)] [Code(2)] [Fields(N)] [Seq(1)] [Checksum(4)] [CR]
//! ```
//!
//! Frames are ASCII; fields are `XY<value>|` tag groups. The codec
//! reconstructs discrete frames from arbitrarily fragmented reads,
//! resynchronizes past malformed spans, and echoes the client's sequence
//! digit in every response.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use crate::core::codec::FrameCodec;
pub use crate::core::frame::{OutboundMessage, ParsedFrame};
pub use config::Config;
pub use error::{ProtocolError, Result};
pub use protocol::dispatcher::Dispatcher;
pub use service::{start_server, start_server_with_shutdown, CircClient};

// =============================================================================
// Version Info
// =============================================================================

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
