//! String similarity scoring on a 0-100 scale.
//!
//! The default metric is the token-set ratio: both strings are reduced to
//! sets of tokens and the shared part is compared against each side's
//! remainder, so extra words on one side ("acme corp" vs "acme") cost little.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strsim::{jaro_winkler, normalized_levenshtein};

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W").expect("static regex");
}

/// Similarity metric used by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    TokenSetRatio,
    JaroWinkler,
    Levenshtein,
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityMetric::TokenSetRatio => write!(f, "token_set_ratio"),
            SimilarityMetric::JaroWinkler => write!(f, "jaro_winkler"),
            SimilarityMetric::Levenshtein => write!(f, "levenshtein"),
        }
    }
}

/// Lowercase, replace non-word characters with spaces, trim.
///
/// Letters outside ASCII are kept and count as one character each.
pub fn full_process(text: &str) -> String {
    NON_WORD.replace_all(&text.to_lowercase(), " ").trim().to_string()
}

/// A string prepared once for repeated scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedKey {
    pub text: String,
    processed: String,
    // Distinct tokens of `processed`, sorted
    tokens: Vec<String>,
    lead: Option<String>,
}

impl PreparedKey {
    pub fn new(text: &str) -> Self {
        let processed = full_process(text);
        let lead = processed.split_whitespace().next().map(str::to_string);
        let mut tokens: Vec<String> = processed.split_whitespace().map(str::to_string).collect();
        tokens.sort();
        tokens.dedup();
        PreparedKey {
            text: text.to_string(),
            processed,
            tokens,
            lead,
        }
    }

    /// First token in text order, used to bucket candidates.
    pub fn lead_token(&self) -> Option<&str> {
        self.lead.as_deref()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Score two raw strings with the given metric.
pub fn score(metric: SimilarityMetric, a: &str, b: &str) -> u8 {
    score_prepared(metric, &PreparedKey::new(a), &PreparedKey::new(b))
}

pub fn score_prepared(metric: SimilarityMetric, a: &PreparedKey, b: &PreparedKey) -> u8 {
    if a.processed.is_empty() || b.processed.is_empty() {
        return 0;
    }
    match metric {
        SimilarityMetric::TokenSetRatio => TokenSetParts::new(a, b).score(),
        SimilarityMetric::JaroWinkler => to_percent(jaro_winkler(&a.processed, &b.processed)),
        SimilarityMetric::Levenshtein => to_percent(normalized_levenshtein(&a.processed, &b.processed)),
    }
}

/// Cheap upper bound on [`score_prepared`].
///
/// Never below the real score. Only the token-set metric has a useful
/// bound; the others report 100.
pub fn score_upper_bound(metric: SimilarityMetric, a: &PreparedKey, b: &PreparedKey) -> u8 {
    if a.processed.is_empty() || b.processed.is_empty() {
        return 0;
    }
    match metric {
        SimilarityMetric::TokenSetRatio => TokenSetParts::new(a, b).upper_bound(),
        _ => 100,
    }
}

/// Token-set ratio of two raw strings.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    score(SimilarityMetric::TokenSetRatio, a, b)
}

/// Indel similarity of two strings: `2 * LCS / (|a| + |b|)` as a percentage.
///
/// Returns 0 when either string is empty.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let common = lcs_len(&a, &b);
    to_percent(2.0 * common as f64 / (a.len() + b.len()) as f64)
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

// Rounds half to even
fn to_percent(similarity: f64) -> u8 {
    (similarity * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}

/// Token split of two prepared keys: shared tokens and each side's remainder.
struct TokenSetParts<'a> {
    sect: Vec<&'a str>,
    only_a: Vec<&'a str>,
    only_b: Vec<&'a str>,
}

impl<'a> TokenSetParts<'a> {
    fn new(a: &'a PreparedKey, b: &'a PreparedKey) -> Self {
        let mut parts = TokenSetParts {
            sect: Vec::new(),
            only_a: Vec::new(),
            only_b: Vec::new(),
        };

        // Both token lists are sorted, so a merge walk splits them
        let (mut i, mut j) = (0, 0);
        while i < a.tokens.len() && j < b.tokens.len() {
            match a.tokens[i].cmp(&b.tokens[j]) {
                Ordering::Equal => {
                    parts.sect.push(&a.tokens[i]);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    parts.only_a.push(&a.tokens[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    parts.only_b.push(&b.tokens[j]);
                    j += 1;
                }
            }
        }
        parts.only_a.extend(a.tokens[i..].iter().map(String::as_str));
        parts.only_b.extend(b.tokens[j..].iter().map(String::as_str));

        parts
    }

    fn score(&self) -> u8 {
        let sect = self.sect.join(" ");
        let combined_a = combine(&sect, &self.only_a.join(" "));
        let combined_b = combine(&sect, &self.only_b.join(" "));

        ratio(&sect, &combined_a)
            .max(ratio(&sect, &combined_b))
            .max(ratio(&combined_a, &combined_b))
    }

    fn upper_bound(&self) -> u8 {
        let sect = joined_len(&self.sect);
        let combined_a = combined_len(sect, joined_len(&self.only_a));
        let combined_b = combined_len(sect, joined_len(&self.only_b));

        ratio_bound(sect, combined_a)
            .max(ratio_bound(sect, combined_b))
            .max(ratio_bound(combined_a, combined_b))
    }
}

fn combine(sect: &str, rest: &str) -> String {
    format!("{sect} {rest}").trim().to_string()
}

fn joined_len(tokens: &[&str]) -> usize {
    if tokens.is_empty() {
        return 0;
    }
    tokens.iter().map(|t| t.chars().count()).sum::<usize>() + tokens.len() - 1
}

fn combined_len(sect: usize, rest: usize) -> usize {
    match (sect, rest) {
        (0, r) => r,
        (s, 0) => s,
        (s, r) => s + 1 + r,
    }
}

// LCS can never exceed the shorter string
fn ratio_bound(a: usize, b: usize) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    to_percent(2.0 * a.min(b) as f64 / (a + b) as f64)
}
