use crate::error::AnalyticsError;
use crate::report::{
    AgentHighlights, AgentPerformance, AgentProfile, Highlight, LeaderboardEntry, PerformanceTier,
};
use crate::stats::{HUNDRED, checked_mul, checked_sub, pct_change, population_stdev, ratio_or_zero};
use core_types::{RawSnapshot, TransactionItem};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};

/// Starting capital every agent is given by the backend. Used as the baseline
/// whenever a recorded value is zero and a percentage would otherwise be undefined.
pub const DEFAULT_CAPITAL: Decimal = dec!(100000);

/// Value reported for the Sharpe-like ratio when volatility is effectively zero.
pub const SHARPE_SENTINEL: Decimal = dec!(1000);

/// Calendar days: the simulated market trades every day.
const DAYS_PER_YEAR: u32 = 365;
const VOLATILITY_EPSILON: Decimal = dec!(0.000000001);

/// Computes per-agent performance from the raw daily snapshots.
///
/// Agents are returned best first (by total profit). Agents with equal profit keep the
/// order in which they first appear in `snapshots`.
pub fn derive_agent_performance(
    snapshots: &[RawSnapshot],
) -> Result<Vec<AgentPerformance>, AnalyticsError> {
    if snapshots.is_empty() {
        return Err(AnalyticsError::Data("no agent snapshots available".to_string()));
    }

    let annualization = Decimal::from(DAYS_PER_YEAR)
        .sqrt()
        .ok_or_else(|| AnalyticsError::Internal("Failed to annualize volatility".to_string()))?;

    let mut performances = partition_by_agent(snapshots)
        .into_iter()
        .map(|(name, rows)| agent_performance(name, &rows, annualization))
        .collect::<Result<Vec<_>, _>>()?;

    performances.sort_by(|a, b| b.total_profit_pct.cmp(&a.total_profit_pct));
    Ok(performances)
}

/// Groups snapshots per agent in first-seen order, each group sorted by day.
fn partition_by_agent(snapshots: &[RawSnapshot]) -> Vec<(&str, Vec<&RawSnapshot>)> {
    let mut groups: Vec<(&str, Vec<&RawSnapshot>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for snapshot in snapshots {
        match index.get(snapshot.agent.as_str()) {
            Some(&i) => groups[i].1.push(snapshot),
            None => {
                index.insert(snapshot.agent.as_str(), groups.len());
                groups.push((snapshot.agent.as_str(), vec![snapshot]));
            }
        }
    }

    for (_, rows) in &mut groups {
        rows.sort_by_key(|s| s.day);
    }
    groups
}

fn agent_performance(
    name: &str,
    rows: &[&RawSnapshot],
    annualization: Decimal,
) -> Result<AgentPerformance, AnalyticsError> {
    let baseline = match rows.first() {
        Some(first) if !first.total_value.is_zero() => first.total_value,
        _ => DEFAULT_CAPITAL,
    };

    let history = rows
        .iter()
        .map(|s| Ok((s.day, pct_change(baseline, s.total_value)?)))
        .collect::<Result<Vec<(u32, Decimal)>, AnalyticsError>>()?;
    let total_profit_pct = history.last().map(|(_, p)| *p).unwrap_or_default();

    let returns = rows
        .windows(2)
        .filter(|w| w[0].total_value > Decimal::ZERO)
        .map(|w| {
            let change = checked_sub(w[1].total_value, w[0].total_value, "daily change")?;
            ratio_or_zero(change, w[0].total_value)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let volatility = checked_mul(population_stdev(&returns)?, annualization, "volatility")?;

    let sharpe_like = if volatility > VOLATILITY_EPSILON {
        ratio_or_zero(total_profit_pct, checked_mul(volatility, HUNDRED, "volatility")?)?
    } else if total_profit_pct > Decimal::ZERO {
        SHARPE_SENTINEL
    } else if total_profit_pct < Decimal::ZERO {
        -SHARPE_SENTINEL
    } else {
        Decimal::ZERO
    };

    Ok(AgentPerformance {
        name: name.to_string(),
        total_profit_pct,
        roi: total_profit_pct / HUNDRED,
        volatility,
        sharpe_like,
        history,
    })
}

/// Ranks agents by total value on the last simulated day.
pub fn final_day_leaderboard(
    snapshots: &[RawSnapshot],
) -> Result<Vec<LeaderboardEntry>, AnalyticsError> {
    let last_day = snapshots
        .iter()
        .map(|s| s.day)
        .max()
        .ok_or_else(|| AnalyticsError::Data("no agent snapshots available".to_string()))?;

    let mut finals: Vec<&RawSnapshot> = snapshots.iter().filter(|s| s.day == last_day).collect();
    finals.sort_by(|a, b| b.total_value.cmp(&a.total_value));

    finals
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            Ok(LeaderboardEntry {
                rank: i + 1,
                agent: s.agent.clone(),
                cash: s.cash,
                total_value: s.total_value,
                net_profit_pct: pct_change(DEFAULT_CAPITAL, s.total_value)?,
            })
        })
        .collect()
}

fn or_default_capital(value: Decimal) -> Decimal {
    if value.is_zero() { DEFAULT_CAPITAL } else { value }
}

fn non_zero_holdings(snapshot: &RawSnapshot) -> BTreeMap<String, u64> {
    snapshot
        .holdings
        .iter()
        .filter(|(_, qty)| **qty > 0)
        .map(|(sector, qty)| (sector.clone(), *qty))
        .collect()
}

/// Collects the detail view of one agent from the full snapshot and trade logs.
pub fn derive_agent_profile(
    snapshots: &[RawSnapshot],
    transactions: &[TransactionItem],
    agent: &str,
) -> Result<AgentProfile, AnalyticsError> {
    if snapshots.is_empty() {
        return Err(AnalyticsError::Data("no agent snapshots available".to_string()));
    }

    let mut rows: Vec<&RawSnapshot> = snapshots.iter().filter(|s| s.agent == agent).collect();
    rows.sort_by_key(|s| s.day);
    let (first, last) = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(AnalyticsError::UnknownAgent(agent.to_string())),
    };

    let mut trades: Vec<TransactionItem> = transactions
        .iter()
        .filter(|t| t.agent == agent)
        .cloned()
        .collect();
    trades.sort_by_key(|t| t.day);

    let initial_value = or_default_capital(first.total_value);
    let final_value = or_default_capital(last.total_value);
    let profit_pct = pct_change(initial_value, final_value)?;

    Ok(AgentProfile {
        name: agent.to_string(),
        first_day: first.day,
        last_day: last.day,
        initial_cash: or_default_capital(first.cash),
        initial_value,
        final_value,
        profit_pct,
        tier: PerformanceTier::classify(profit_pct),
        total_trades: trades.len(),
        initial_holdings: non_zero_holdings(first),
        final_holdings: non_zero_holdings(last),
        trades,
    })
}

/// Picks the headline agents for the overview cards.
///
/// Ties go to the agent that comes first in `performances`. Returns `None` when there
/// are no agents at all.
pub fn agent_highlights(performances: &[AgentPerformance]) -> Option<AgentHighlights> {
    fn pick(
        performances: &[AgentPerformance],
        metric: impl Fn(&AgentPerformance) -> Decimal,
        better: impl Fn(Decimal, Decimal) -> bool,
    ) -> Option<Highlight> {
        let mut best: Option<&AgentPerformance> = None;
        for candidate in performances {
            match best {
                Some(current) if !better(metric(candidate), metric(current)) => {}
                _ => best = Some(candidate),
            }
        }
        best.map(|p| Highlight {
            agent: p.name.clone(),
            value: metric(p),
        })
    }

    Some(AgentHighlights {
        winner: pick(performances, |p| p.total_profit_pct, |a, b| a > b)?,
        loser: pick(performances, |p| p.total_profit_pct, |a, b| a < b)?,
        most_volatile: pick(performances, |p| p.volatility, |a, b| a > b)?,
        best_sharpe_like: pick(performances, |p| p.sharpe_like, |a, b| a > b)?,
    })
}
