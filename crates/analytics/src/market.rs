use crate::error::AnalyticsError;
use crate::report::{MarketSummary, PriceTrace, SectorMove, TracePoint};
use crate::stats::{
    HUNDRED, checked_mul, checked_sub, coefficient_of_variation, mean, pct_change, ratio_or_zero,
};
use core_types::PriceHistoryEntry;
use rust_decimal::Decimal;

/// Returns the first and last entries, or a `Data` error when the history is too short
/// to measure any change.
pub(crate) fn bounds(
    history: &[PriceHistoryEntry],
) -> Result<(&PriceHistoryEntry, &PriceHistoryEntry), AnalyticsError> {
    match history {
        [first, .., last] => Ok((first, last)),
        _ => Err(AnalyticsError::Data(format!(
            "at least 2 days of prices are required, got {}",
            history.len()
        ))),
    }
}

pub(crate) fn price_on(entry: &PriceHistoryEntry, sector: &str) -> Result<Decimal, AnalyticsError> {
    entry.price(sector).ok_or_else(|| {
        AnalyticsError::Data(format!("sector '{sector}' has no price on day {}", entry.day))
    })
}

/// Spread of prices across sectors on one day.
fn cross_sectional_dispersion(prices: &[Decimal]) -> Result<Decimal, AnalyticsError> {
    coefficient_of_variation(prices)
}

/// Summarizes the whole market from its price history.
///
/// The sector set is taken from the first entry. Ties for top gainer or loser go to
/// the sector listed first.
pub fn derive_market_summary(
    history: &[PriceHistoryEntry],
) -> Result<MarketSummary, AnalyticsError> {
    let (first, last) = bounds(history)?;
    if first.prices.is_empty() {
        return Err(AnalyticsError::Data("price history lists no sectors".to_string()));
    }

    let mut moves = Vec::with_capacity(first.prices.len());
    let mut fractions = Vec::with_capacity(first.prices.len());
    let mut final_prices = Vec::with_capacity(first.prices.len());

    for (sector, opening) in &first.prices {
        let closing = price_on(last, sector)?;
        fractions.push(ratio_or_zero(checked_sub(closing, *opening, "price change")?, *opening)?);
        final_prices.push(closing);
        moves.push(SectorMove {
            sector: sector.clone(),
            change_pct: pct_change(*opening, closing)?,
        });
    }

    let mut top_gainer = &moves[0];
    let mut top_loser = &moves[0];
    for candidate in &moves[1..] {
        if candidate.change_pct > top_gainer.change_pct {
            top_gainer = candidate;
        }
        if candidate.change_pct < top_loser.change_pct {
            top_loser = candidate;
        }
    }

    Ok(MarketSummary {
        total_sector_count: moves.len(),
        avg_change_pct: checked_mul(mean(&fractions)?, HUNDRED, "average change")?,
        top_gainer: top_gainer.clone(),
        top_loser: top_loser.clone(),
        volatility_index: cross_sectional_dispersion(&final_prices)?,
    })
}

/// Per-sector price series with the return since the first day, for charting raw and
/// normalized prices side by side.
pub fn sector_price_traces(history: &[PriceHistoryEntry]) -> Result<Vec<PriceTrace>, AnalyticsError> {
    let (first, _) = bounds(history)?;

    first
        .prices
        .iter()
        .map(|(sector, opening)| {
            let points = history
                .iter()
                .map(|entry| {
                    let price = price_on(entry, sector)?;
                    Ok(TracePoint {
                        day: entry.day,
                        price,
                        return_pct: pct_change(*opening, price)?,
                    })
                })
                .collect::<Result<Vec<_>, AnalyticsError>>()?;
            Ok(PriceTrace {
                sector: sector.clone(),
                points,
            })
        })
        .collect()
}
