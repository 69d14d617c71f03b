//! Lexical sentiment scoring for entries bound for the social feed.
//!
//! Tokens are looked up in the AFINN-165 word list (integer polarity from -5
//! to +5) and summed. A token directly after a negator ("not", "don't", ...)
//! counts with its sign flipped. Overrides replace or extend the base list;
//! the default overrides mark slurs with a polarity large enough to sink any
//! sentence they appear in.

use std::collections::HashMap;

/// AFINN-165, one `word<TAB>polarity` pair per line.
const AFINN_165: &str = include_str!("lexicon/afinn-165.txt");

fn afinn() -> impl Iterator<Item = (&'static str, i64)> {
    AFINN_165.lines().filter_map(|line| {
        let (word, polarity) = line.split_once('\t')?;
        // Phrases never match a single token.
        if word.contains(' ') {
            return None;
        }
        Some((word, polarity.trim().parse().ok()?))
    })
}

#[rustfmt::skip]
const NEGATORS: &[&str] = &[
    "aren't", "arent", "can't", "cant", "couldn't", "couldnt", "didn't", "didnt", "doesn't",
    "doesnt", "don't", "dont", "hasn't", "hasnt", "haven't", "havent", "isn't", "isnt",
    "neither", "never", "no", "non", "nor", "not", "shouldn't", "shouldnt", "wasn't", "wasnt",
    "won't", "wont", "wouldn't", "wouldnt",
];

/// Overrides applied on top of the base word list.
pub const DEFAULT_OVERRIDES: &[(&str, i64)] = &[("nazi", -10), ("nazis", -10)];

/// Word-polarity scorer.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    lexicon: HashMap<String, i64>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::with_overrides(DEFAULT_OVERRIDES.iter().copied())
    }
}

impl SentimentAnalyzer {
    /// Base word list plus `overrides`, later entries winning.
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let mut lexicon: HashMap<String, i64> = afinn()
            .map(|(word, polarity)| (word.to_owned(), polarity))
            .collect();
        lexicon.extend(
            overrides
                .into_iter()
                .map(|(word, polarity)| (word.to_lowercase(), polarity)),
        );
        Self { lexicon }
    }

    /// Signed sum of token polarities.
    pub fn score(&self, text: &str) -> i64 {
        let mut negate_next = false;
        let mut total: i64 = 0;
        for token in tokens(text) {
            if let Some(polarity) = self.lexicon.get(token.as_str()) {
                let signed = if negate_next { -polarity } else { *polarity };
                total = total.saturating_add(signed);
            }
            negate_next = NEGATORS.contains(&token.as_str());
        }
        total
    }

    /// Entries scoring below zero never reach the social feed.
    pub fn is_shareable(&self, text: &str) -> bool {
        self.score(text) >= 0
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '\'' | '’' | '-')))
        .map(|token| token.trim_matches('-'))
        .filter(|token| !token.is_empty())
        .map(|token| token.replace('’', "'").to_lowercase())
}
