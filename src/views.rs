//! Terminal rendering of derived metrics. Nothing here computes; it only formats.

use analytics::{
    AgentHighlights, AgentPerformance, AgentProfile, LeaderboardEntry, MarketSummary, NewsDay,
    PerformanceTier, PriceTrace, SectorMetrics, VolatilityBand,
};
use api_client::StatusResponse;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use core_types::{Sentiment, TransactionItem};
use rust_decimal::Decimal;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn signed_pct(value: Decimal) -> Cell {
    let color = if value > Decimal::ZERO {
        Color::Green
    } else if value < Decimal::ZERO {
        Color::Red
    } else {
        Color::Reset
    };
    Cell::new(format!("{value:+.2}%"))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

fn money(value: Decimal) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

fn number(value: Decimal, places: usize) -> Cell {
    Cell::new(format!("{value:.places$}")).set_alignment(CellAlignment::Right)
}

pub fn print_status(status: &StatusResponse) {
    println!("Backend status: {}", status.status.label());
    if status.total_days > 0 {
        println!("Progress:       day {} of {}", status.day.min(status.total_days), status.total_days);
    }
    if let Some(error) = &status.error {
        println!("Error:          {error}");
    }
}

pub fn print_highlights(highlights: &AgentHighlights) {
    println!("Top performer:   {} ({:+.2}%)", highlights.winner.agent, highlights.winner.value);
    println!("Worst performer: {} ({:+.2}%)", highlights.loser.agent, highlights.loser.value);
    println!(
        "Most volatile:   {} ({:.4})",
        highlights.most_volatile.agent, highlights.most_volatile.value
    );
    println!(
        "Best risk-adj.:  {} ({:.4})",
        highlights.best_sharpe_like.agent, highlights.best_sharpe_like.value
    );
}

pub fn performance_table(performances: &[AgentPerformance]) -> Table {
    let mut table = new_table(vec!["#", "Agent", "Profit", "ROI", "Volatility", "Sharpe-like", "Tier"]);
    for (i, p) in performances.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&p.name),
            signed_pct(p.total_profit_pct),
            number(p.roi, 4),
            number(p.volatility, 4),
            number(p.sharpe_like, 3),
            Cell::new(PerformanceTier::classify(p.total_profit_pct)),
        ]);
    }
    table
}

pub fn leaderboard_table(entries: &[LeaderboardEntry]) -> Table {
    let mut table = new_table(vec!["Rank", "Agent", "Cash", "Total value", "Net profit"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.rank),
            Cell::new(&entry.agent),
            money(entry.cash),
            money(entry.total_value),
            signed_pct(entry.net_profit_pct),
        ]);
    }
    table
}

fn trades_table(trades: &[TransactionItem]) -> Table {
    let mut table = new_table(vec!["Day", "Sector", "Action", "Price", "Qty"]);
    for trade in trades {
        table.add_row(vec![
            Cell::new(trade.day),
            Cell::new(&trade.sector),
            Cell::new(trade.action),
            money(trade.price),
            Cell::new(trade.qty).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn print_profile(
    profile: &AgentProfile,
    params: Option<&serde_json::Value>,
    trades: &[TransactionItem],
) {
    println!("{} [{}]", profile.name, profile.tier);
    println!("Day {} to Day {}", profile.first_day, profile.last_day);
    println!(
        "Initial cash {:.2} | initial value {:.2} | final value {:.2} | profit {:+.2}% | {} trades",
        profile.initial_cash,
        profile.initial_value,
        profile.final_value,
        profile.profit_pct,
        profile.total_trades
    );

    let mut holdings = new_table(vec!["Sector", "Initial", "Final"]);
    let sectors = profile
        .initial_holdings
        .keys()
        .chain(profile.final_holdings.keys())
        .collect::<std::collections::BTreeSet<_>>();
    for sector in sectors {
        holdings.add_row(vec![
            Cell::new(sector),
            Cell::new(profile.initial_holdings.get(sector).copied().unwrap_or(0)),
            Cell::new(profile.final_holdings.get(sector).copied().unwrap_or(0)),
        ]);
    }
    println!("{holdings}");

    if let Some(params) = params {
        match serde_json::to_string_pretty(params) {
            Ok(pretty) => println!("Strategy parameters:\n{pretty}"),
            Err(e) => tracing::warn!(error = %e, "Could not render agent parameters"),
        }
    }

    if trades.is_empty() {
        println!("No trades match.");
    } else {
        println!("{}", trades_table(trades));
    }
}

pub fn print_market(summary: &MarketSummary, traces: &[PriceTrace]) {
    println!(
        "{} sectors | average change {:+.2}% | volatility index {:.4}",
        summary.total_sector_count, summary.avg_change_pct, summary.volatility_index
    );
    println!(
        "Top gainer: {} ({:+.2}%) | Top loser: {} ({:+.2}%)",
        summary.top_gainer.sector,
        summary.top_gainer.change_pct,
        summary.top_loser.sector,
        summary.top_loser.change_pct
    );

    let mut table = new_table(vec!["Sector", "Open", "Low", "High", "Close", "Return"]);
    for trace in traces {
        let (Some(open), Some(close)) = (trace.points.first(), trace.points.last()) else {
            continue;
        };
        let low = trace.points.iter().map(|p| p.price).min().unwrap_or(open.price);
        let high = trace.points.iter().map(|p| p.price).max().unwrap_or(open.price);
        table.add_row(vec![
            Cell::new(&trace.sector),
            money(open.price),
            money(low),
            money(high),
            money(close.price),
            signed_pct(close.return_pct),
        ]);
    }
    println!("{table}");
}

pub fn sector_table(metrics: &[SectorMetrics]) -> Table {
    let mut table = new_table(vec![
        "Sector", "Final price", "Change", "Volatility", "Band", "Net volume", "Peak day",
    ]);
    for sector in metrics {
        let net: i64 = sector.daily_net_volume.iter().map(|(_, qty)| qty).sum();
        let peak = sector
            .daily_net_volume
            .iter()
            .filter(|(_, qty)| *qty != 0)
            .max_by_key(|(_, qty)| qty.abs())
            .map(|(day, qty)| format!("day {day} ({qty:+})"))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&sector.name),
            money(sector.final_price),
            signed_pct(sector.total_change_pct),
            number(sector.volatility_index, 4),
            Cell::new(VolatilityBand::classify(sector.volatility_index)),
            Cell::new(format!("{net:+}")).set_alignment(CellAlignment::Right),
            Cell::new(peak),
        ]);
    }
    table
}

pub fn print_news(days: &[NewsDay]) {
    if days.is_empty() {
        println!("No news was generated for this run.");
        return;
    }
    for day in days {
        let mut table = new_table(vec!["Sector", "Sentiment", "Impact", "Headline"]);
        for item in &day.headlines {
            let color = match item.sentiment {
                Sentiment::Positive => Color::Green,
                Sentiment::Neutral => Color::Reset,
                Sentiment::Negative => Color::Red,
            };
            table.add_row(vec![
                Cell::new(&item.sector),
                Cell::new(item.sentiment).fg(color),
                signed_pct(item.percent_change),
                Cell::new(&item.headline),
            ]);
        }
        println!("Day {}\n{table}", day.day);
    }
}
