use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The direction of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// The sign applied to a trade's quantity when netting buys against sells.
    pub fn sign(&self) -> i64 {
        match self {
            TradeAction::Buy => 1,
            TradeAction::Sell => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(TradeAction::Buy),
            "SELL" => Ok(TradeAction::Sell),
            other => Err(CoreError::InvalidInput(
                "trade action".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// The tone the news generator assigned to a headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        };
        f.write_str(s)
    }
}

/// The client-side phase of a simulation run.
///
/// This is the only status consumers are allowed to gate views on. The richer
/// backend vocabulary is folded into these four values by the lifecycle controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Complete,
    Failed,
}

impl RunPhase {
    /// COMPLETE and FAILED stay put until an explicit reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Complete | RunPhase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "IDLE",
            RunPhase::Running => "RUNNING",
            RunPhase::Complete => "COMPLETE",
            RunPhase::Failed => "FAILED",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status word reported by the simulation backend's `/status` endpoint.
///
/// Besides the five documented values the backend announces intermediate stages
/// (`EVOLVING_AGENTS`, `SIMULATING`, ...). Those are kept verbatim in `Stage` so the
/// lifecycle can show them while still treating them as "running".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackendStatus {
    Idle,
    GeneratingNews,
    Running,
    Complete,
    Failed,
    Stage(String),
}

impl BackendStatus {
    pub fn as_wire(&self) -> &str {
        match self {
            BackendStatus::Idle => "IDLE",
            BackendStatus::GeneratingNews => "GENERATING_NEWS",
            BackendStatus::Running => "RUNNING",
            BackendStatus::Complete => "COMPLETE",
            BackendStatus::Failed => "FAILED",
            BackendStatus::Stage(stage) => stage,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BackendStatus::Complete | BackendStatus::Failed)
    }

    /// Human-readable stage name, e.g. `GENERATING NEWS`.
    pub fn label(&self) -> String {
        self.as_wire().replace('_', " ")
    }
}

impl From<String> for BackendStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IDLE" => BackendStatus::Idle,
            "GENERATING_NEWS" => BackendStatus::GeneratingNews,
            "RUNNING" => BackendStatus::Running,
            "COMPLETE" => BackendStatus::Complete,
            "FAILED" => BackendStatus::Failed,
            _ => BackendStatus::Stage(value),
        }
    }
}

impl From<BackendStatus> for String {
    fn from(value: BackendStatus) -> Self {
        value.as_wire().to_string()
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}
