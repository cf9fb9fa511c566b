//! # Transport Layer
//!
//! Socket-level plumbing. The only transport is plain TCP: sessions are
//! long-lived point-to-point links between a circulation terminal and
//! the server, with authentication handled as a protocol transaction
//! rather than a transport credential.

pub mod tcp;
