//! # Error Types
//!
//! Error handling for the circulation protocol.
//!
//! This module defines all error variants that can occur during protocol
//! operations, from low-level I/O failures to frame-level violations.
//!
//! ## Error Categories
//! - **I/O Errors**: Socket and accept-loop failures
//! - **Framing Errors**: Bad length prefixes, missing terminators, oversized input
//! - **Startup Errors**: Bind failures, invalid configuration
//!
//! Framing errors are almost always handled locally: the decoder logs the
//! offending span and resynchronizes at the next delimiter rather than
//! failing the connection. The variants still exist as values so the pure
//! parsing functions can report exactly what was wrong.

use std::io;
use thiserror::Error;

/// Primary error type for all protocol operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid length prefix {0:?}")]
    InvalidLengthPrefix(String),

    #[error("frame too short: {0} bytes")]
    FrameTooShort(usize),

    #[error("declared length {declared} does not match delimiter position {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("frame does not end with a carriage return")]
    MissingTerminator,

    #[error("frame is not valid ASCII text")]
    NonAsciiFrame,

    #[error("receive buffer reached {0} bytes without a message delimiter")]
    RunawayBuffer(usize),

    #[error("encoded frame too large: {0} bytes (length prefix is 4 digits)")]
    OversizedFrame(usize),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("custom error: {0}")]
    Custom(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
