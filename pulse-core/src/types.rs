use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

pub const PLATFORM_REDDIT: &str = "reddit";

/// Stored in place of an author the source could not report.
pub const UNKNOWN_AUTHOR: &str = "[deleted]";

pub const MAX_STORED_TEXT_CHARS: usize = 500;
pub const MAX_DISPLAY_TEXT_CHARS: usize = 200;
pub const MIN_TEXT_CHARS: usize = 10;

const POSITIVE_THRESHOLD: f64 = 0.1;
const NEGATIVE_THRESHOLD: f64 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// The only mapping from a polarity score to a label.
    pub fn from_score(score: f64) -> Self {
        if score > POSITIVE_THRESHOLD {
            Sentiment::Positive
        } else if score < NEGATIVE_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(CoreError::InvalidInput {
                message: format!("unknown sentiment label '{}'", other),
            }),
        }
    }
}

/// A polarity score together with the label derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub sentiment: Sentiment,
    pub score: f64,
}

impl Classification {
    pub fn from_score(score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            sentiment: Sentiment::from_score(score),
            score,
        }
    }
}

/// Recency granularity for keyword search, in escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    Week,
    Month,
}

impl TimeWindow {
    pub const ESCALATION: [TimeWindow; 3] = [TimeWindow::Day, TimeWindow::Week, TimeWindow::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post as handed over by a content source, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    pub title: String,
    pub body: String,
    pub author: Option<String>,
}

impl RawPost {
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

/// A classified post ready to be appended to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub platform: String,
    pub author: String,
    pub text: String,
    pub sentiment: Sentiment,
    pub score: f64,
    pub timestamp: String,
    pub keyword: String,
}

impl NewPost {
    pub fn classified(
        platform: &str,
        author: Option<&str>,
        text: &str,
        classification: Classification,
        keyword: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            author: author.unwrap_or(UNKNOWN_AUTHOR).to_string(),
            text: truncate_chars(text, MAX_STORED_TEXT_CHARS).to_string(),
            sentiment: classification.sentiment,
            score: classification.score,
            timestamp: format_timestamp(at),
            keyword: normalize_keyword(keyword),
        }
    }
}

/// A stored post as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub platform: String,
    pub author: String,
    pub text: String,
    pub sentiment: String,
    pub score: f64,
    pub timestamp: String,
    pub keyword: String,
}

impl PostRecord {
    pub fn sentiment(&self) -> Option<Sentiment> {
        self.sentiment.parse().ok()
    }

    pub fn collected_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

/// Normalizes an optional filter; blank filters mean "all keywords".
pub fn keyword_filter(keyword: Option<&str>) -> Option<String> {
    keyword
        .map(normalize_keyword)
        .filter(|keyword| !keyword.is_empty())
}

/// Returns at most `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn is_substantial(text: &str) -> bool {
    text.trim().chars().count() >= MIN_TEXT_CHARS
}

/// Fixed-width UTC form, so lexicographic order matches chronological order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 with any offset, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(Sentiment::from_score(-0.1), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(0.0), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(0.1), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(0.1000001), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(0.0999999), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(-0.1000001), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(-0.0999999), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(1.0), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(-1.0), Sentiment::Negative);
    }

    #[test]
    fn test_classification_is_consistent() {
        for score in [-3.0, -0.5, -0.1, 0.0, 0.05, 0.2, 7.5, f64::NAN] {
            let classification = Classification::from_score(score);
            assert!(classification.score >= -1.0 && classification.score <= 1.0);
            assert_eq!(
                classification.sentiment,
                Sentiment::from_score(classification.score)
            );
        }
    }

    #[test]
    fn test_sentiment_label_parsing() {
        assert_eq!("positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!(Sentiment::Negative.to_string(), "negative");
        assert!("angry".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_new_post_truncates_and_normalizes() {
        let text = "x".repeat(600);
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let post = NewPost::classified(
            PLATFORM_REDDIT,
            None,
            &text,
            Classification::from_score(0.4),
            "  Tesla ",
            at,
        );

        assert_eq!(post.text.chars().count(), MAX_STORED_TEXT_CHARS);
        assert_eq!(post.keyword, "tesla");
        assert_eq!(post.author, UNKNOWN_AUTHOR);
        assert_eq!(post.sentiment, Sentiment::Positive);
        assert_eq!(post.timestamp, "2024-03-01T12:00:00.000000Z");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 4), "héll");
        assert_eq!(truncate_chars(text, 100), text);
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_substantial_text() {
        assert!(!is_substantial("  short   "));
        assert!(is_substantial("long enough text"));
    }

    #[test]
    fn test_keyword_filter() {
        assert_eq!(keyword_filter(Some(" TESLA ")), Some("tesla".to_string()));
        assert_eq!(keyword_filter(Some("   ")), None);
        assert_eq!(keyword_filter(None), None);
    }

    #[test]
    fn test_timestamp_parsing() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:30:00.000000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T14:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01T12:30:00.123"),
            Some(expected + chrono::Duration::milliseconds(123))
        );
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_formatted_timestamps_sort_chronologically() {
        let earlier = format_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        let later = format_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert!(earlier < later);
    }
}
