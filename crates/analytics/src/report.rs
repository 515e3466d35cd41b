use core_types::{NewsItem, TransactionItem};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Derived performance of one agent over a whole run.
///
/// Built fresh from the snapshots on every call; nothing here is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub name: String,
    /// Profit against the agent's first recorded total value, in percent.
    pub total_profit_pct: Decimal,
    /// `total_profit_pct` as a fraction (0.05 for 5%).
    pub roi: Decimal,
    /// Annualized population standard deviation of daily returns.
    pub volatility: Decimal,
    /// Profit per unit of volatility. An approximation, not a rigorous Sharpe ratio:
    /// there is no risk-free rate and it saturates at +/-1000 when volatility is zero.
    pub sharpe_like: Decimal,
    /// `(day, cumulative profit %)` for every snapshot, in day order.
    pub history: Vec<(u32, Decimal)>,
}

/// A sector's price move over the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMove {
    pub sector: String,
    pub change_pct: Decimal,
}

/// Market-wide statistics over the full price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub total_sector_count: usize,
    pub avg_change_pct: Decimal,
    pub top_gainer: SectorMove,
    pub top_loser: SectorMove,
    /// Cross-sectional dispersion of final-day prices (stdev over mean).
    pub volatility_index: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMetrics {
    pub name: String,
    pub final_price: Decimal,
    pub total_change_pct: Decimal,
    /// Dispersion of this sector's own price series over time (stdev over mean).
    pub volatility_index: Decimal,
    /// `(day, net quantity)` where buys count positive and sells negative.
    pub daily_net_volume: Vec<(u32, i64)>,
}

/// All headlines of one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsDay {
    pub day: u32,
    pub headlines: Vec<NewsItem>,
}

/// One row of the final-day ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub agent: String,
    pub cash: Decimal,
    pub total_value: Decimal,
    pub net_profit_pct: Decimal,
}

/// Everything the detail view shows about a single agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub first_day: u32,
    pub last_day: u32,
    pub initial_cash: Decimal,
    pub initial_value: Decimal,
    pub final_value: Decimal,
    pub profit_pct: Decimal,
    pub tier: PerformanceTier,
    pub total_trades: usize,
    pub initial_holdings: BTreeMap<String, u64>,
    pub final_holdings: BTreeMap<String, u64>,
    pub trades: Vec<TransactionItem>,
}

/// A named agent together with the figure that singled it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub agent: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentHighlights {
    pub winner: Highlight,
    pub loser: Highlight,
    pub most_volatile: Highlight,
    pub best_sharpe_like: Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub day: u32,
    pub price: Decimal,
    /// Change since the sector's first price, in percent.
    pub return_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTrace {
    pub sector: String,
    pub points: Vec<TracePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceTier {
    TopTier,
    Profitable,
    Marginal,
    LossLeader,
}

impl PerformanceTier {
    pub fn classify(profit_pct: Decimal) -> Self {
        if profit_pct >= dec!(5) {
            PerformanceTier::TopTier
        } else if profit_pct > Decimal::ZERO {
            PerformanceTier::Profitable
        } else if profit_pct <= dec!(-5) {
            PerformanceTier::LossLeader
        } else {
            PerformanceTier::Marginal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceTier::TopTier => "Top Tier",
            PerformanceTier::Profitable => "Profitable",
            PerformanceTier::Marginal => "Marginal",
            PerformanceTier::LossLeader => "Loss Leader",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse bucket for a sector's time-series volatility index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityBand {
    Low,
    Medium,
    High,
    Extreme,
}

impl VolatilityBand {
    pub fn classify(index: Decimal) -> Self {
        if index > dec!(0.3) {
            VolatilityBand::Extreme
        } else if index > dec!(0.1) {
            VolatilityBand::High
        } else if index > dec!(0.05) {
            VolatilityBand::Medium
        } else {
            VolatilityBand::Low
        }
    }
}

impl fmt::Display for VolatilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolatilityBand::Low => "Low",
            VolatilityBand::Medium => "Medium",
            VolatilityBand::High => "High",
            VolatilityBand::Extreme => "Extreme",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(PerformanceTier::classify(dec!(5)), PerformanceTier::TopTier);
        assert_eq!(PerformanceTier::classify(dec!(4.99)), PerformanceTier::Profitable);
        assert_eq!(PerformanceTier::classify(Decimal::ZERO), PerformanceTier::Marginal);
        assert_eq!(PerformanceTier::classify(dec!(-4.99)), PerformanceTier::Marginal);
        assert_eq!(PerformanceTier::classify(dec!(-5)), PerformanceTier::LossLeader);
    }

    #[test]
    fn band_boundaries_are_exclusive() {
        assert_eq!(VolatilityBand::classify(dec!(0.05)), VolatilityBand::Low);
        assert_eq!(VolatilityBand::classify(dec!(0.051)), VolatilityBand::Medium);
        assert_eq!(VolatilityBand::classify(dec!(0.1)), VolatilityBand::Medium);
        assert_eq!(VolatilityBand::classify(dec!(0.3)), VolatilityBand::High);
        assert_eq!(VolatilityBand::classify(dec!(0.31)), VolatilityBand::Extreme);
    }
}
