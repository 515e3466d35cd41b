use core_types::{CoreError, TradeAction, TransactionItem};
use std::cmp::Ordering;
use std::str::FromStr;

/// Column a transaction log can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Day,
    Sector,
    Action,
    Price,
    Qty,
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(SortKey::Day),
            "sector" => Ok(SortKey::Sector),
            "action" => Ok(SortKey::Action),
            "price" => Ok(SortKey::Price),
            "qty" | "quantity" => Ok(SortKey::Qty),
            other => Err(CoreError::InvalidInput("sort key".to_string(), other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// A search-and-sort view over a transaction log. Defaults to newest day first.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    /// Case-insensitive substring matched against the sector or the action.
    pub search: Option<String>,
    pub sort_by: SortKey,
    pub direction: SortDirection,
}

fn action_rank(action: TradeAction) -> u8 {
    match action {
        TradeAction::Buy => 1,
        TradeAction::Sell => 0,
    }
}

impl TransactionQuery {
    pub fn apply(&self, transactions: &[TransactionItem]) -> Vec<TransactionItem> {
        let needle = self
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty());

        let mut rows: Vec<TransactionItem> = transactions
            .iter()
            .filter(|t| match &needle {
                Some(needle) => {
                    t.sector.to_lowercase().contains(needle.as_str())
                        || t.action.as_str().to_lowercase().contains(needle.as_str())
                }
                None => true,
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ordering = self.compare(a, b);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        rows
    }

    fn compare(&self, a: &TransactionItem, b: &TransactionItem) -> Ordering {
        match self.sort_by {
            SortKey::Day => a.day.cmp(&b.day),
            SortKey::Sector => a.sector.cmp(&b.sector),
            SortKey::Action => action_rank(a.action).cmp(&action_rank(b.action)),
            SortKey::Price => a.price.cmp(&b.price),
            SortKey::Qty => a.qty.cmp(&b.qty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn trade(day: u32, sector: &str, action: TradeAction, qty: u64) -> TransactionItem {
        TransactionItem {
            day,
            agent: "ValueAgent".to_string(),
            sector: sector.to_string(),
            action,
            price: Decimal::from(day * 10 + 1),
            qty,
        }
    }

    fn log() -> Vec<TransactionItem> {
        vec![
            trade(1, "Tech", TradeAction::Buy, 5),
            trade(3, "Gold", TradeAction::Sell, 2),
            trade(2, "Pharma", TradeAction::Buy, 9),
            trade(2, "Energy", TradeAction::Sell, 1),
        ]
    }

    #[test]
    fn default_is_newest_first() {
        let rows = TransactionQuery::default().apply(&log());
        let days: Vec<u32> = rows.iter().map(|t| t.day).collect();
        assert_eq!(days, vec![3, 2, 2, 1]);
        // Equal days keep their input order.
        assert_eq!(rows[1].sector, "Pharma");
    }

    #[test]
    fn search_matches_sector_or_action() {
        let query = TransactionQuery {
            search: Some("SEL".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(&log()).len(), 2);

        let query = TransactionQuery {
            search: Some("ph".to_string()),
            ..Default::default()
        };
        let rows = query.apply(&log());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sector, "Pharma");
    }

    #[test]
    fn buys_rank_above_sells() {
        let query = TransactionQuery {
            sort_by: SortKey::Action,
            direction: SortDirection::Descending,
            search: None,
        };
        let rows = query.apply(&log());
        assert_eq!(rows[0].action, TradeAction::Buy);
        assert_eq!(rows[3].action, TradeAction::Sell);
    }

    #[test]
    fn ascending_quantity() {
        let query = TransactionQuery {
            sort_by: "qty".parse().unwrap(),
            direction: SortDirection::Ascending,
            search: None,
        };
        let qtys: Vec<u64> = query.apply(&log()).iter().map(|t| t.qty).collect();
        assert_eq!(qtys, vec![1, 2, 5, 9]);
        assert!("volume".parse::<SortKey>().is_err());
    }
}
