//! Text-overlap quality scores.
//!
//! Both scores are pure functions over text and return values in `[0, 1]`.
//! They are deliberately naive: substring hits for relevance and token-set
//! Jaccard overlap for factuality.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Fraction of `reference_terms` that occur in `answer`.
///
/// Matching is a case-insensitive substring test. Returns 0 when no terms
/// are given.
pub fn relevance<S: AsRef<str>>(reference_terms: &[S], answer: &str) -> f64 {
    if reference_terms.is_empty() {
        return 0.0;
    }
    let answer = answer.to_lowercase();
    let hits = reference_terms
        .iter()
        .filter(|t| answer.contains(&t.as_ref().to_lowercase()))
        .count();
    hits as f64 / reference_terms.len() as f64
}

/// Jaccard overlap between the lowercased whitespace tokens of `context`
/// and `answer`.
///
/// Returns 0 if either side has no tokens.
pub fn factuality(context: &str, answer: &str) -> f64 {
    let ctx = token_set(context);
    let ans = token_set(answer);
    if ctx.is_empty() || ans.is_empty() {
        return 0.0;
    }
    let intersection = ctx.intersection(&ans).count();
    let union = ctx.union(&ans).count();
    intersection as f64 / union as f64
}

fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Both scores for one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub relevance: f64,
    pub factuality: f64,
}

impl ScoreCard {
    pub fn compute<S: AsRef<str>>(reference_terms: &[S], context: &str, answer: &str) -> Self {
        Self {
            relevance: relevance(reference_terms, answer),
            factuality: factuality(context, answer),
        }
    }
}
