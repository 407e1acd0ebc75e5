use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").expect("valid hashtag regex"));
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z]{4,}\b").expect("valid word regex"));

/// Trend tokens of `text`, lower-cased: every hashtag (with its `#`) in order
/// of appearance, followed by every purely alphabetic word of four or more
/// ASCII letters. Repeats are kept so callers can count them.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();

    HASHTAG_RE
        .find_iter(&lowered)
        .chain(WORD_RE.find_iter(&lowered))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashtags_come_first() {
        let tokens = extract_keywords("Loving the new #Tesla #EV update");
        assert_eq!(
            tokens,
            vec!["#tesla", "#ev", "loving", "tesla", "update"]
        );
    }

    #[test]
    fn test_short_and_mixed_words_are_skipped() {
        let tokens = extract_keywords("the car is a gr8 ride, wow");
        assert_eq!(tokens, vec!["ride"]);
    }

    #[test]
    fn test_duplicates_preserved() {
        let tokens = extract_keywords("Rust rust RUST #rust #rust");
        assert_eq!(tokens, vec!["#rust", "#rust", "rust", "rust", "rust"]);
    }

    #[test]
    fn test_non_ascii_words_are_not_split() {
        assert!(extract_keywords("café naïve").is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("!!! 123 ...").is_empty());
    }
}
