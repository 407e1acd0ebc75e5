//! Pure read-side transforms over stored records.

use chrono::{DateTime, Utc};
use database::SentimentCounts;
use pulse_core::{parse_timestamp, truncate_chars, PostRecord, Sentiment, MAX_DISPLAY_TEXT_CHARS};
use sentiment_engine::extract_keywords;
use std::collections::{BTreeMap, HashMap};

use crate::report::{PostSummary, TrendEntry, TrendReport};

/// `count / total` as a percentage with one decimal; zero when `total` is zero.
pub fn percentage(count: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round_to(count as f64 / total as f64 * 100.0, 1)
}

/// Halves round to the even neighbour, so `0.125` at two places is `0.12`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Top `limit` tokens across all texts. Equal counts keep first-seen order.
pub fn rank_trends<'a, I>(texts: I, limit: usize) -> TrendReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<TrendEntry> = Vec::new();
    let mut total = 0;

    for token in texts.into_iter().flat_map(extract_keywords) {
        total += 1;
        match positions.get(&token) {
            Some(&index) => entries[index].count += 1,
            None => {
                positions.insert(token.clone(), entries.len());
                entries.push(TrendEntry {
                    keyword: token,
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(limit);

    TrendReport {
        trends: entries,
        total,
    }
}

/// Buckets records by UTC calendar day. Records with an unreadable
/// timestamp or label are left out.
pub fn bucket_by_day(records: &[PostRecord]) -> BTreeMap<String, SentimentCounts> {
    let mut days: BTreeMap<String, SentimentCounts> = BTreeMap::new();

    for record in records {
        let (Some(at), Some(sentiment)) = (record.collected_at(), record.sentiment()) else {
            continue;
        };
        let day = days.entry(at.format("%Y-%m-%d").to_string()).or_default();
        match sentiment {
            Sentiment::Positive => day.positive += 1,
            Sentiment::Negative => day.negative += 1,
            Sentiment::Neutral => day.neutral += 1,
        }
    }
    days
}

/// Human-readable age of `timestamp`, truncated to whole hours or days.
pub fn relative_time(now: DateTime<Utc>, timestamp: &str) -> String {
    let Some(at) = parse_timestamp(timestamp) else {
        return "Unknown".to_string();
    };

    let hours = (now - at).num_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else {
        format!("{} days ago", hours / 24)
    }
}

pub fn summarize(record: &PostRecord, now: DateTime<Utc>) -> PostSummary {
    PostSummary {
        platform: record.platform.clone(),
        author: record.author.clone(),
        text: truncate_chars(&record.text, MAX_DISPLAY_TEXT_CHARS).to_string(),
        sentiment: record.sentiment.clone(),
        score: round_to(record.score, 2),
        time: relative_time(now, &record.timestamp),
        keyword: record.keyword.clone(),
    }
}
