//! # Service Layer
//!
//! Connection lifecycle on top of the transport and protocol layers.
//!
//! ## Components
//! - **Server**: accept loop, graceful shutdown, session spawning
//! - **Session**: one connection's read/dispatch/respond loop
//! - **Client**: sequenced request/response calls for the transaction set

pub mod client;
pub mod server;
pub mod session;

pub use client::CircClient;
pub use server::{serve, start_server, start_server_with_shutdown};
pub use session::{ResponseSequence, Session};
