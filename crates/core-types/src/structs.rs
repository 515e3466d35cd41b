use crate::enums::{Sentiment, TradeAction};
use rust_decimal::Decimal;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// The backend writes its records with pandas, so every field arrives in PascalCase.

/// One agent's portfolio state at the close of one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Agent")]
    pub agent: String,
    #[serde(rename = "Cash")]
    pub cash: Decimal,
    /// Cash plus holdings marked to market.
    #[serde(rename = "TotalValue")]
    pub total_value: Decimal,
    /// Units held per sector. The key set depends on the run's sectors, so it is
    /// flattened next to the fixed fields on the wire.
    #[serde(flatten)]
    pub holdings: BTreeMap<String, u64>,
}

/// One executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Agent")]
    pub agent: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Action")]
    pub action: TradeAction,
    #[serde(rename = "Price")]
    pub price: Decimal,
    #[serde(rename = "Qty")]
    pub qty: u64,
}

impl TransactionItem {
    /// The signed quantity: positive for buys, negative for sells.
    ///
    /// Quantities beyond `i64::MAX` saturate rather than wrap.
    pub fn signed_qty(&self) -> i64 {
        self.action.sign() * i64::try_from(self.qty).unwrap_or(i64::MAX)
    }
}

/// One generated headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Headline")]
    pub headline: String,
    #[serde(rename = "Sentiment")]
    pub sentiment: Sentiment,
    /// The price move the headline is meant to cause, in percent.
    #[serde(rename = "PercentChange")]
    pub percent_change: Decimal,
}

/// The closing price of every sector on one day.
///
/// On the wire this is a flat object, `{"Day": 3, "Tech": 451.2, "Gold": 1190.0}`.
/// Sector order matters to consumers (ties in rankings go to the first sector seen),
/// so prices are kept in the order the object lists them rather than in a hash map.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistoryEntry {
    pub day: u32,
    pub prices: Vec<(String, Decimal)>,
}

impl PriceHistoryEntry {
    pub fn new<S: Into<String>>(day: u32, prices: impl IntoIterator<Item = (S, Decimal)>) -> Self {
        Self {
            day,
            prices: prices.into_iter().map(|(s, p)| (s.into(), p)).collect(),
        }
    }

    pub fn price(&self, sector: &str) -> Option<Decimal> {
        self.prices
            .iter()
            .find(|(name, _)| name == sector)
            .map(|(_, price)| *price)
    }

    pub fn sectors(&self) -> impl Iterator<Item = &str> {
        self.prices.iter().map(|(name, _)| name.as_str())
    }
}

const DAY_KEY: &str = "Day";

impl Serialize for PriceHistoryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.prices.len() + 1))?;
        map.serialize_entry(DAY_KEY, &self.day)?;
        for (sector, price) in &self.prices {
            map.serialize_entry(sector, price)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PriceHistoryEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = PriceHistoryEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object with a `Day` field and one price per sector")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut day = None;
                let mut prices = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key == DAY_KEY {
                        if day.is_some() {
                            return Err(de::Error::duplicate_field(DAY_KEY));
                        }
                        day = Some(map.next_value::<u32>()?);
                    } else {
                        prices.push((key, map.next_value::<Decimal>()?));
                    }
                }
                let day = day.ok_or_else(|| de::Error::missing_field(DAY_KEY))?;
                Ok(PriceHistoryEntry { day, prices })
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}
