use pulse_core::Classification;
use std::sync::Arc;
use tracing::trace;

use crate::lexicon::SentimentLexicon;

/// Tokens after a negator whose valence is flipped.
const NEGATION_WINDOW: usize = 3;
/// Applied to a negated valence: "not good" is mildly negative, not "bad".
const NEGATION_FACTOR: f64 = -0.5;

/// Lexicon-based polarity scorer.
///
/// The score is the mean valence of the opinion words found in the text,
/// after intensifiers and negations are applied, clamped to [-1.0, 1.0].
/// Text without opinion words scores 0.0.
#[derive(Debug, Clone)]
pub struct SentimentClassifier {
    lexicon: Arc<SentimentLexicon>,
}

impl SentimentClassifier {
    pub fn new() -> Self {
        Self::with_lexicon(SentimentLexicon::english())
    }

    pub fn with_lexicon(lexicon: SentimentLexicon) -> Self {
        Self {
            lexicon: Arc::new(lexicon),
        }
    }

    pub fn classify(&self, text: &str) -> Classification {
        let score = self.polarity(text);
        let classification = Classification::from_score(score);
        trace!(
            "Classified {} chars as {} ({:.3})",
            text.len(),
            classification.sentiment,
            classification.score
        );
        classification
    }

    pub fn polarity(&self, text: &str) -> f64 {
        let mut total = 0.0;
        let mut opinion_words = 0usize;
        let mut modifier: Option<f64> = None;
        let mut since_negation: Option<usize> = None;

        for token in tokenize(text) {
            if self.lexicon.is_negator(&token) {
                since_negation = Some(0);
                continue;
            }

            if let Some(factor) = self.lexicon.intensity(&token) {
                modifier = Some(factor);
            } else if let Some(valence) = self.lexicon.valence(&token) {
                let mut score = valence * modifier.take().unwrap_or(1.0);
                if since_negation.is_some() {
                    score *= NEGATION_FACTOR;
                    since_negation = None;
                }
                total += score.clamp(-1.0, 1.0);
                opinion_words += 1;
            } else {
                modifier = None;
            }

            since_negation = since_negation
                .map(|distance| distance + 1)
                .filter(|distance| *distance < NEGATION_WINDOW);
        }

        if opinion_words == 0 {
            0.0
        } else {
            (total / opinion_words as f64).clamp(-1.0, 1.0)
        }
    }
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Lower-cased word tokens with apostrophes dropped, so "Don't" becomes "dont".
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
}
