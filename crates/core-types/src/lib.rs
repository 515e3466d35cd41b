//! # Marketview Core Types
//!
//! The shared vocabulary of the workspace: the raw records a simulation run produces,
//! the status words spoken by the backend and by the client-side lifecycle, and the
//! three user-facing error shapes every crate maps its failures onto.
//!
//! This is a Layer 0 crate. It has no knowledge of HTTP, configuration, or analytics.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{BackendStatus, RunPhase, Sentiment, TradeAction};
pub use error::{CoreError, ErrorShape};
pub use structs::{NewsItem, PriceHistoryEntry, RawSnapshot, TransactionItem};
