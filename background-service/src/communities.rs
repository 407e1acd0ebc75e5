use pulse_core::normalize_keyword;
use std::collections::HashMap;

/// Communities tried for keywords without a mapping.
pub const DEFAULT_COMMUNITIES: [&str; 2] = ["popular", "AskReddit"];

/// How many mapped communities the fallback stage visits.
pub const FALLBACK_COMMUNITY_COUNT: usize = 2;

const BUILT_IN: &[(&str, &[&str])] = &[
    ("car", &["cars", "autos", "automotive"]),
    ("bb", &["basketball", "nba"]),
    ("tesla", &["teslamotors", "electricvehicles"]),
    ("gaming", &["gaming", "games"]),
    ("tech", &["technology", "tech"]),
    ("food", &["food", "cooking"]),
];

/// Keyword to community mapping used when site-wide search finds nothing.
#[derive(Debug, Clone)]
pub struct CommunityMap {
    entries: HashMap<String, Vec<String>>,
}

impl CommunityMap {
    pub fn builtin() -> Self {
        let entries = BUILT_IN
            .iter()
            .map(|(keyword, communities)| {
                (
                    keyword.to_string(),
                    communities.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Built-in entries plus `overrides`; an override replaces the built-in
    /// list for the same keyword.
    pub fn with_overrides(overrides: &HashMap<String, Vec<String>>) -> Self {
        let mut map = Self::builtin();
        for (keyword, communities) in overrides {
            let communities: Vec<String> = communities
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if !communities.is_empty() {
                map.entries.insert(normalize_keyword(keyword), communities);
            }
        }
        map
    }

    /// The communities the fallback stage visits for `keyword`, in order.
    pub fn lookup(&self, keyword: &str) -> Vec<String> {
        match self.entries.get(&normalize_keyword(keyword)) {
            Some(communities) => communities
                .iter()
                .take(FALLBACK_COMMUNITY_COUNT)
                .cloned()
                .collect(),
            None => DEFAULT_COMMUNITIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommunityMap {
    fn default() -> Self {
        Self::builtin()
    }
}
