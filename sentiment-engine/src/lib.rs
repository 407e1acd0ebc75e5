//! Text analysis used by the collection pipeline: polarity scoring and
//! trend-token extraction.

pub mod classifier;
pub mod extractor;
pub mod lexicon;

pub use classifier::SentimentClassifier;
pub use extractor::extract_keywords;
pub use lexicon::SentimentLexicon;
