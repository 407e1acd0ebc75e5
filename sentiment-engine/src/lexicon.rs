use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Valence of common English opinion words, in [-1.0, 1.0].
const VALENCES: &[(&str, f64)] = &[
    // positive
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("fantastic", 0.4),
    ("wonderful", 1.0),
    ("brilliant", 0.9),
    ("perfect", 1.0),
    ("best", 1.0),
    ("better", 0.5),
    ("nice", 0.6),
    ("love", 0.5),
    ("loved", 0.7),
    ("loves", 0.5),
    ("lovely", 0.5),
    ("like", 0.2),
    ("liked", 0.3),
    ("enjoy", 0.4),
    ("enjoyed", 0.4),
    ("happy", 0.8),
    ("glad", 0.5),
    ("excited", 0.4),
    ("exciting", 0.3),
    ("fun", 0.3),
    ("beautiful", 0.85),
    ("impressive", 1.0),
    ("impressed", 0.7),
    ("favorite", 0.5),
    ("favourite", 0.5),
    ("cool", 0.35),
    ("solid", 0.4),
    ("reliable", 0.5),
    ("recommend", 0.4),
    ("recommended", 0.4),
    ("helpful", 0.5),
    ("useful", 0.3),
    ("easy", 0.43),
    ("fast", 0.2),
    ("smooth", 0.4),
    ("clean", 0.37),
    ("affordable", 0.4),
    ("cheap", 0.4),
    ("win", 0.8),
    ("winning", 0.5),
    ("success", 0.6),
    ("successful", 0.75),
    ("strong", 0.43),
    ("safe", 0.5),
    ("incredible", 0.9),
    ("superb", 1.0),
    ("outstanding", 0.5),
    ("positive", 0.23),
    ("thanks", 0.2),
    ("thank", 0.2),
    ("congrats", 0.5),
    ("wow", 0.1),
    ("bullish", 0.5),
    ("upgrade", 0.3),
    ("improved", 0.4),
    ("improvement", 0.4),
    ("worth", 0.3),
    ("interesting", 0.5),
    ("proud", 0.8),
    ("hope", 0.2),
    ("hopeful", 0.4),
    ("fine", 0.4),
    ("correct", 0.3),
    ("fair", 0.7),
    ("friendly", 0.4),
    ("pleasant", 0.73),
    ("satisfied", 0.5),
    ("stunning", 0.5),
    // negative
    ("bad", -0.7),
    ("worse", -0.4),
    ("worst", -1.0),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("horrible", -1.0),
    ("poor", -0.4),
    ("hate", -0.8),
    ("hated", -0.9),
    ("hates", -0.8),
    ("dislike", -0.5),
    ("sad", -0.5),
    ("angry", -0.5),
    ("annoying", -0.8),
    ("annoyed", -0.6),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("disappointment", -0.6),
    ("boring", -1.0),
    ("broken", -0.4),
    ("broke", -0.4),
    ("buggy", -0.5),
    ("bug", -0.3),
    ("bugs", -0.3),
    ("crash", -0.5),
    ("crashed", -0.5),
    ("crashes", -0.5),
    ("fail", -0.5),
    ("failed", -0.5),
    ("failure", -0.6),
    ("fails", -0.5),
    ("problem", -0.3),
    ("problems", -0.3),
    ("issue", -0.2),
    ("issues", -0.2),
    ("wrong", -0.5),
    ("ugly", -0.7),
    ("stupid", -0.8),
    ("useless", -0.5),
    ("waste", -0.6),
    ("scam", -0.8),
    ("fraud", -0.8),
    ("dangerous", -0.6),
    ("expensive", -0.5),
    ("overpriced", -0.6),
    ("slow", -0.3),
    ("difficult", -0.5),
    ("hard", -0.29),
    ("lose", -0.4),
    ("losing", -0.4),
    ("lost", -0.3),
    ("loss", -0.4),
    ("dead", -0.2),
    ("death", -0.5),
    ("kill", -0.5),
    ("killed", -0.5),
    ("crazy", -0.6),
    ("scary", -0.5),
    ("afraid", -0.6),
    ("worried", -0.5),
    ("worry", -0.4),
    ("mess", -0.5),
    ("pathetic", -1.0),
    ("ridiculous", -0.33),
    ("disgusting", -1.0),
    ("nightmare", -0.8),
    ("recall", -0.3),
    ("bearish", -0.5),
    ("negative", -0.3),
    ("unfortunately", -0.5),
    ("sucks", -0.7),
    ("sick", -0.71),
    ("pain", -0.5),
    ("painful", -0.7),
    ("unhappy", -0.6),
    ("frustrating", -0.4),
    ("frustrated", -0.7),
    ("unreliable", -0.5),
    ("toxic", -0.6),
    ("lame", -0.5),
];

/// Words that scale the valence of the next opinion word.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.2),
    ("extremely", 1.5),
    ("incredibly", 1.4),
    ("super", 1.3),
    ("so", 1.2),
    ("too", 1.2),
    ("absolutely", 1.4),
    ("totally", 1.3),
    ("highly", 1.3),
    ("quite", 1.1),
    ("pretty", 1.1),
    ("somewhat", 0.7),
    ("slightly", 0.5),
    ("barely", 0.4),
    ("kinda", 0.8),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "nor", "none", "nobody", "nothing", "neither", "cannot", "without",
    "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "werent", "wont", "cant", "couldnt",
    "shouldnt", "wouldnt", "aint",
];

static DEFAULT_LEXICON: Lazy<SentimentLexicon> = Lazy::new(|| SentimentLexicon {
    valences: VALENCES
        .iter()
        .map(|(word, score)| (word.to_string(), *score))
        .collect(),
    intensifiers: INTENSIFIERS
        .iter()
        .map(|(word, factor)| (word.to_string(), *factor))
        .collect(),
    negators: NEGATORS.iter().map(|word| word.to_string()).collect(),
});

/// Word tables consulted by the classifier. Lookups expect lower-cased tokens
/// with apostrophes removed ("don't" -> "dont").
#[derive(Debug, Clone)]
pub struct SentimentLexicon {
    valences: HashMap<String, f64>,
    intensifiers: HashMap<String, f64>,
    negators: HashSet<String>,
}

impl SentimentLexicon {
    pub fn english() -> Self {
        DEFAULT_LEXICON.clone()
    }

    pub fn with_word(mut self, word: &str, valence: f64) -> Self {
        self.valences
            .insert(word.to_lowercase(), valence.clamp(-1.0, 1.0));
        self
    }

    pub fn valence(&self, token: &str) -> Option<f64> {
        self.valences.get(token).copied()
    }

    pub fn intensity(&self, token: &str) -> Option<f64> {
        self.intensifiers.get(token).copied()
    }

    pub fn is_negator(&self, token: &str) -> bool {
        self.negators.contains(token)
    }
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self::english()
    }
}
