use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 365;
pub const MAX_VOLATILITY: Decimal = dec!(5);

/// Sectors the backend market engine is built around. Every run must price all of them.
pub const REQUIRED_SECTORS: [(&str, Decimal); 5] = [
    ("Tech", dec!(450)),
    ("Pharma", dec!(220)),
    ("Finance", dec!(180)),
    ("Energy", dec!(85)),
    ("Gold", dec!(1200)),
];

pub const DEFAULT_AGENTS: [&str; 8] = [
    "AggressiveAgent",
    "ConservativeAgent",
    "ContrarianAgent",
    "GeneticTraderAgent",
    "HerdFollowerAgent",
    "LongTermInvestorAgent",
    "LSTMTraderAgent",
    "MomentumAgent",
];

/// Every agent strategy the backend knows how to instantiate.
pub const KNOWN_AGENTS: [&str; 16] = [
    "AggressiveAgent",
    "ConservativeAgent",
    "ContrarianAgent",
    "GeneticTraderAgent",
    "HerdFollowerAgent",
    "LongTermInvestorAgent",
    "LSTMTraderAgent",
    "MomentumAgent",
    "NewsFollowerAgent",
    "PanicTraderAgent",
    "PpoTraderAgent",
    "RandomAgent",
    "RlTraderAgent",
    "ShortTermInvestorAgent",
    "ValueAgent",
    "RelativeStrengthAgent",
];

/// The user-editable parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of trading days to simulate.
    pub num_days: u32,
    /// Opening price for each sector.
    pub initial_prices: BTreeMap<String, Decimal>,
    /// Agent strategies taking part in the run.
    pub agents: Vec<String>,
    /// Multiplier applied to the backend's random price shocks.
    pub volatility: Decimal,
    /// Whether the backend should generate news before simulating.
    pub news_enabled: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_days: 30,
            initial_prices: REQUIRED_SECTORS
                .iter()
                .map(|(sector, price)| (sector.to_string(), *price))
                .collect(),
            agents: DEFAULT_AGENTS.iter().map(|a| a.to_string()).collect(),
            volatility: dec!(1.0),
            news_enabled: true,
        }
    }
}

impl RunConfig {
    /// Checks the configuration against the ranges the backend accepts.
    ///
    /// All problems are collected into one message so the user can fix them in a single pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !(MIN_DAYS..=MAX_DAYS).contains(&self.num_days) {
            problems.push(format!(
                "num_days must be between {MIN_DAYS} and {MAX_DAYS}, got {}",
                self.num_days
            ));
        }

        if self.volatility < Decimal::ZERO || self.volatility > MAX_VOLATILITY {
            problems.push(format!(
                "volatility must be between 0 and {MAX_VOLATILITY}, got {}",
                self.volatility
            ));
        }

        if self.agents.is_empty() {
            problems.push("at least one agent must be selected".to_string());
        }
        let mut seen = BTreeSet::new();
        for agent in &self.agents {
            if !KNOWN_AGENTS.contains(&agent.as_str()) {
                problems.push(format!("unknown agent '{agent}'"));
            } else if !seen.insert(agent.as_str()) {
                problems.push(format!("agent '{agent}' is selected more than once"));
            }
        }

        for (sector, _) in REQUIRED_SECTORS.iter() {
            if !self.initial_prices.contains_key(*sector) {
                problems.push(format!("missing initial price for sector '{sector}'"));
            }
        }
        for (sector, price) in &self.initial_prices {
            if !REQUIRED_SECTORS.iter().any(|(known, _)| *known == sector.as_str()) {
                problems.push(format!("unknown sector '{sector}'"));
            } else if price.is_sign_negative() && !price.is_zero() {
                problems.push(format!(
                    "initial price for '{sector}' must not be negative, got {price}"
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }

    /// Sets one sector's opening price, as parsed from a `SECTOR=PRICE` pair.
    pub fn set_price(&mut self, pair: &str) -> Result<(), ConfigError> {
        let (sector, price) = pair.split_once('=').ok_or_else(|| {
            ConfigError::Validation(format!("expected SECTOR=PRICE, got '{pair}'"))
        })?;
        let price: Decimal = price.trim().parse().map_err(|_| {
            ConfigError::Validation(format!("'{}' is not a valid price", price.trim()))
        })?;
        self.initial_prices.insert(sector.trim().to_string(), price);
        Ok(())
    }
}
