use crate::report::NewsDay;
use core_types::NewsItem;

/// Groups headlines by day, keeping days in the order they first appear and
/// headlines in input order within a day. News is optional, so no input is no output.
pub fn group_news_by_day(news: &[NewsItem]) -> Vec<NewsDay> {
    let mut days: Vec<NewsDay> = Vec::new();
    for item in news {
        match days.iter_mut().find(|d| d.day == item.day) {
            Some(day) => day.headlines.push(item.clone()),
            None => days.push(NewsDay {
                day: item.day,
                headlines: vec![item.clone()],
            }),
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Sentiment;
    use rust_decimal_macros::dec;

    fn item(day: u32, headline: &str) -> NewsItem {
        NewsItem {
            day,
            sector: "Energy".to_string(),
            headline: headline.to_string(),
            sentiment: Sentiment::Neutral,
            percent_change: dec!(0.5),
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let news = vec![item(3, "a"), item(1, "b"), item(3, "c"), item(2, "d")];
        let grouped = group_news_by_day(&news);
        let days: Vec<u32> = grouped.iter().map(|d| d.day).collect();
        assert_eq!(days, vec![3, 1, 2]);
        let first: Vec<&str> = grouped[0].headlines.iter().map(|h| h.headline.as_str()).collect();
        assert_eq!(first, vec!["a", "c"]);
    }

    #[test]
    fn no_news_is_fine() {
        assert!(group_news_by_day(&[]).is_empty());
    }

    #[test]
    fn grouping_is_idempotent() {
        let news = vec![item(2, "a"), item(1, "b"), item(2, "c")];
        assert_eq!(group_news_by_day(&news), group_news_by_day(&news));
    }
}
