//! # Core Protocol Components
//!
//! Frame handling and wire-format codecs.
//!
//! This module provides the foundation for the protocol: the pure frame
//! parse/serialize functions and the streaming codec used over live
//! connections.
//!
//! ## Components
//! - **Frame**: ASCII frame format with length prefix, sequence digit, and checksum
//! - **Codec**: Tokio codec for framing over byte streams
//!
//! ## Wire Format
//! ```text
//! [Length(4 digits)] [Code(2)] [Fields(N)] [Seq(1)] [Checksum(4)] [CR]
//! ```
//!
//! ## Robustness
//! - Declared length is validated against the delimiter position
//! - Malformed spans are skipped at delimiter boundaries (resync)
//! - Receive buffer is capped while no delimiter has arrived

pub mod codec;
pub mod frame;
