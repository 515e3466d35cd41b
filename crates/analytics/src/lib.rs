//! # Marketview Analytics
//!
//! Turns the raw records of a finished simulation run (daily agent snapshots, the trade
//! log, sector price history and generated news) into the metrics the views display.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O and no logging. It depends only on `core-types`, so every
//!   derivation can be exercised with hand-built records.
//! - **Recomputed, Never Cached:** Each function takes the raw collections and returns
//!   fresh results. Calling twice with the same input yields identical output.
//! - **No Panics on Degenerate Input:** Every division by zero resolves to 0 or a documented
//!   sentinel. Inputs too small to measure anything are reported as `AnalyticsError::Data`.
//!
//! ## Public API
//!
//! - Agents: `derive_agent_performance`, `final_day_leaderboard`, `derive_agent_profile`,
//!   `agent_highlights`.
//! - Market: `derive_market_summary`, `sector_price_traces`, `derive_sector_metrics`.
//! - News: `group_news_by_day`.
//! - Trade log: `TransactionQuery`.

// Declare the modules that constitute this crate.
pub mod agents;
pub mod error;
pub mod ledger;
pub mod market;
pub mod news;
pub mod report;
pub mod sectors;
mod stats;

// Re-export the key components to create a clean, public-facing API.
pub use agents::{
    DEFAULT_CAPITAL, SHARPE_SENTINEL, agent_highlights, derive_agent_performance,
    derive_agent_profile, final_day_leaderboard,
};
pub use error::AnalyticsError;
pub use ledger::{SortDirection, SortKey, TransactionQuery};
pub use market::{derive_market_summary, sector_price_traces};
pub use news::group_news_by_day;
pub use report::{
    AgentHighlights, AgentPerformance, AgentProfile, Highlight, LeaderboardEntry, MarketSummary,
    NewsDay, PerformanceTier, PriceTrace, SectorMetrics, SectorMove, TracePoint, VolatilityBand,
};
pub use sectors::derive_sector_metrics;
