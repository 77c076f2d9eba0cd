//! Approximate string matching used by the fuzzy resolver strategies.
//!
//! The scorer is a capability: [`WeightedRatio`] is the full weighted
//! token-ratio scorer, [`ClosestMatch`] a plain edit-distance fallback and
//! [`DisabledMatcher`] declines everything so only the exact strategies run.

use std::collections::BTreeSet;

use rapidfuzz::fuzz;
use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

/// Weight applied to token-based ratios.
const UNBASE_SCALE: f64 = 0.95;

/// Length ratio under which strings are compared as a whole.
const PARTIAL_LENGTH_RATIO: f64 = 1.5;

/// Length ratio from which partial matches are heavily discounted.
const LONG_LENGTH_RATIO: f64 = 8.0;

/// Best candidate found by a matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredChoice {
    /// Position in the choice list
    pub index: usize,
    /// Similarity score (0.0 - 100.0)
    pub score: f64,
}

/// Which matcher a resolver is built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    #[default]
    WeightedRatio,
    Closest,
    Disabled,
}

impl MatcherKind {
    /// Build the matcher for this kind.
    pub fn build(self) -> Box<dyn ApproximateMatcher> {
        match self {
            MatcherKind::WeightedRatio => Box::new(WeightedRatio),
            MatcherKind::Closest => Box::new(ClosestMatch),
            MatcherKind::Disabled => Box::new(DisabledMatcher),
        }
    }
}

/// Approximate-matching capability.
pub trait ApproximateMatcher: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Score `choice` against `query` on a 0-100 scale.
    ///
    /// `None` means the matcher cannot score at all.
    fn score(&self, query: &str, choice: &str) -> Option<f64>;

    /// Best-scoring choice. Ties keep the first occurrence.
    fn extract_one(&self, query: &str, choices: &[&str]) -> Option<ScoredChoice> {
        let mut best: Option<ScoredChoice> = None;
        for (index, choice) in choices.iter().enumerate() {
            let Some(score) = self.score(query, choice) else {
                continue;
            };
            if best.map_or(true, |b| score > b.score) {
                best = Some(ScoredChoice { index, score });
            }
        }
        best
    }
}

/// Weighted token-ratio scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRatio;

impl ApproximateMatcher for WeightedRatio {
    fn name(&self) -> &'static str {
        "weighted_ratio"
    }

    fn score(&self, query: &str, choice: &str) -> Option<f64> {
        Some(weighted_ratio(query, choice))
    }
}

/// Plain normalized Levenshtein similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestMatch;

impl ApproximateMatcher for ClosestMatch {
    fn name(&self) -> &'static str {
        "closest"
    }

    fn score(&self, query: &str, choice: &str) -> Option<f64> {
        let query = preprocess(query);
        let choice = preprocess(choice);
        if query.is_empty() || choice.is_empty() {
            return Some(0.0);
        }
        Some(normalized_levenshtein(&query, &choice) * 100.0)
    }
}

/// Matcher used when approximate matching is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMatcher;

impl ApproximateMatcher for DisabledMatcher {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn score(&self, _query: &str, _choice: &str) -> Option<f64> {
        None
    }
}

/// Weighted ratio of two raw strings (0.0 - 100.0).
///
/// Similar lengths compare whole strings and token orderings; very different
/// lengths fall back to the best substring alignment, discounted.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let a = preprocess(a);
    let b = preprocess(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let base = ratio(&a, &b);
    if len_ratio < PARTIAL_LENGTH_RATIO {
        let token = token_sort_ratio(&a, &b).max(token_set_ratio(&a, &b));
        return base.max(token * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio >= LONG_LENGTH_RATIO { 0.6 } else { 0.9 };
    let partial = partial_ratio(&a, &b) * partial_scale;
    let partial_token = partial_token_ratio(&a, &b) * UNBASE_SCALE * partial_scale;

    base.max(partial).max(partial_token)
}

/// Lower-case, replace non-alphanumerics with spaces, collapse whitespace.
fn preprocess(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Indel similarity of two strings (0.0 - 100.0).
pub fn ratio(a: &str, b: &str) -> f64 {
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Best ratio of the shorter string against every window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for start in 0..=(long.len() - short.len()) {
        let window = &long[start..start + short.len()];
        let score = fuzz::ratio(short.iter().copied(), window.iter().copied()) * 100.0;
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn tokens(text: &str) -> BTreeSet<&str> {
    text.split_whitespace().collect()
}

fn join_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    tokens.into_iter().collect::<Vec<_>>().join(" ")
}

fn sorted_tokens(text: &str) -> String {
    let mut parts: Vec<&str> = text.split_whitespace().collect();
    parts.sort_unstable();
    parts.join(" ")
}

/// Ratio after sorting the words of both strings.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Ratio over shared words plus the remaining words of each side.
///
/// Returns 100 when the words of one string are a subset of the other's.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = tokens(a);
    let tokens_b = tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = join_tokens(tokens_a.intersection(&tokens_b).copied());
    let diff_ab = join_tokens(tokens_a.difference(&tokens_b).copied());
    let diff_ba = join_tokens(tokens_b.difference(&tokens_a).copied());

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let combine = |diff: &str| {
        if intersection.is_empty() {
            diff.to_string()
        } else {
            format!("{} {}", intersection, diff)
        }
    };
    let combined_ab = combine(&diff_ab);
    let combined_ba = combine(&diff_ba);

    let mut best = ratio(&combined_ab, &combined_ba);
    if !intersection.is_empty() {
        best = best
            .max(ratio(&intersection, &combined_ab))
            .max(ratio(&intersection, &combined_ba));
    }
    best
}

/// Partial ratio over sorted words; 100 as soon as one word is shared.
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = tokens(a);
    let tokens_b = tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    if !tokens_a.is_disjoint(&tokens_b) {
        return 100.0;
    }
    partial_ratio(&join_tokens(tokens_a), &join_tokens(tokens_b))
}
