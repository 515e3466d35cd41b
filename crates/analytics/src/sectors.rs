use crate::error::AnalyticsError;
use crate::market::{bounds, price_on};
use crate::report::SectorMetrics;
use crate::stats::{coefficient_of_variation, pct_change};
use core_types::{PriceHistoryEntry, TransactionItem};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// How much a single sector's price wandered over the run.
fn time_series_dispersion(series: &[Decimal]) -> Result<Decimal, AnalyticsError> {
    coefficient_of_variation(series)
}

/// Derives per-sector price and trading-pressure metrics.
///
/// Net volume is reported for exactly the days present in `history`; trades on other
/// days or on sectors the history does not list are ignored.
pub fn derive_sector_metrics(
    history: &[PriceHistoryEntry],
    transactions: &[TransactionItem],
) -> Result<Vec<SectorMetrics>, AnalyticsError> {
    let (first, last) = bounds(history)?;

    let mut net_volume: HashMap<(&str, u32), i64> = HashMap::new();
    for trade in transactions {
        let net = net_volume.entry((trade.sector.as_str(), trade.day)).or_insert(0);
        *net = net.saturating_add(trade.signed_qty());
    }

    first
        .prices
        .iter()
        .map(|(sector, opening)| {
            let series = history
                .iter()
                .map(|entry| price_on(entry, sector))
                .collect::<Result<Vec<_>, _>>()?;
            let final_price = price_on(last, sector)?;

            let daily_net_volume = history
                .iter()
                .map(|entry| {
                    let net = net_volume
                        .get(&(sector.as_str(), entry.day))
                        .copied()
                        .unwrap_or(0);
                    (entry.day, net)
                })
                .collect();

            Ok(SectorMetrics {
                name: sector.clone(),
                final_price,
                total_change_pct: pct_change(*opening, final_price)?,
                volatility_index: time_series_dispersion(&series)?,
                daily_net_volume,
            })
        })
        .collect()
}
