//! # Utility Modules
//!
//! Supporting utilities for logging and observability.
//!
//! ## Components
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe observability counters

pub mod logging;
pub mod metrics;

// Re-export public types for advanced users
pub use metrics::{global_metrics, Metrics, MetricsSnapshot};
