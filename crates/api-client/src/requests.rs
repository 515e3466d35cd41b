use configuration::RunConfig;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// The JSON body of `POST /run-simulation`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest<'a> {
    pub num_days: u32,
    #[serde(serialize_with = "prices_as_numbers")]
    pub initial_prices: &'a BTreeMap<String, Decimal>,
    pub agents: &'a [String],
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub volatility: Decimal,
    pub news_enabled: bool,
}

impl<'a> From<&'a RunConfig> for RunRequest<'a> {
    fn from(config: &'a RunConfig) -> Self {
        Self {
            num_days: config.num_days,
            initial_prices: &config.initial_prices,
            agents: &config.agents,
            volatility: config.volatility,
            news_enabled: config.news_enabled,
        }
    }
}

fn prices_as_numbers<S: Serializer>(
    prices: &&BTreeMap<String, Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(prices.len()))?;
    for (sector, price) in prices.iter() {
        map.serialize_entry(sector, &price.to_f64().unwrap_or_default())?;
    }
    map.end()
}
