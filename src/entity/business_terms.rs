//! Legal-form lexicon
//!
//! Company names in transaction data carry legal-form designations ("GmbH",
//! "Corp", "S.A.", "Sp. z o.o.") that say nothing about which company is
//! meant. This module holds the reference lexicon and strips those terms from
//! already-normalized names.
//!
//! Terms are stored as token sequences. Longer sequences are tried first, so
//! "gmbh co kg" is removed as a unit before "kg" gets a chance to match.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::trace;

use super::normalizer::normalize;
use super::TARGET_ENTITY;

// Built-in lexicon, written in normalized form (lowercase, no punctuation)
pub const DEFAULT_BUSINESS_TERMS: &[&str] = &[
    // German-speaking
    "gmbh",
    "gmbh co kg",
    "gmbh co kgaa",
    "gmbh co ohg",
    "ag",
    "ag co kg",
    "se co kg",
    "co kg",
    "kg",
    "kgaa",
    "ohg",
    "ug",
    "ug haftungsbeschränkt",
    "mbh",
    "ev",
    "eg",
    "se",
    // English-speaking
    "corp",
    "corporation",
    "inc",
    "incorporated",
    "ltd",
    "limited",
    "llc",
    "llp",
    "lp",
    "plc",
    "co",
    "company",
    "pty",
    "pty ltd",
    "pvt ltd",
    "private limited",
    "public limited company",
    "limited liability company",
    // Romance languages
    "sa",
    "sarl",
    "sas",
    "sasu",
    "snc",
    "srl",
    "spa",
    "sl",
    "slu",
    "lda",
    "ltda",
    "sa de cv",
    "s de rl",
    // Benelux and Nordics
    "bv",
    "bvba",
    "nv",
    "vof",
    "ab",
    "as",
    "aps",
    "asa",
    "oy",
    "oyj",
    // Central and Eastern Europe
    "kft",
    "zrt",
    "sro",
    "sp z oo",
    "doo",
    "ad",
    "ooo",
    "pjsc",
];

lazy_static! {
    static ref DEFAULT_LEXICON: BusinessTerms = BusinessTerms::new(DEFAULT_BUSINESS_TERMS);
}

/// Where in a name legal-form terms are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermPositions {
    pub suffix: bool,
    pub prefix: bool,
    pub middle: bool,
}

impl Default for TermPositions {
    fn default() -> Self {
        TermPositions {
            suffix: true,
            prefix: false,
            middle: false,
        }
    }
}

/// Compiled lexicon of legal-form terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessTerms {
    // Longest token sequence first, then lexicographic
    terms: Vec<Vec<String>>,
}

impl BusinessTerms {
    /// Build a lexicon from raw term strings.
    ///
    /// Every term is normalized first, so "S.A." and "sa" compile to the same
    /// entry. Terms that normalize to nothing are dropped.
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        let unique: BTreeSet<Vec<String>> = terms
            .iter()
            .map(|term| {
                normalize(term.as_ref())
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|tokens| !tokens.is_empty())
            .collect();

        let mut terms: Vec<Vec<String>> = unique.into_iter().collect();
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        BusinessTerms { terms }
    }

    /// The built-in lexicon.
    pub fn builtin() -> &'static BusinessTerms {
        &DEFAULT_LEXICON
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Remove lexicon terms from a normalized name.
    ///
    /// Repeats until nothing more can be removed, so stacked designations
    /// like "ltd inc" are both stripped. A name made only of legal terms
    /// strips to the empty string.
    pub fn strip(&self, text: &str, positions: TermPositions) -> String {
        let mut tokens: Vec<&str> = text.split_whitespace().collect();

        loop {
            let before = tokens.len();

            for term in &self.terms {
                let n = term.len();

                if positions.suffix && tokens.len() >= n && matches_at(&tokens, tokens.len() - n, term) {
                    tokens.truncate(tokens.len() - n);
                }

                if positions.prefix && tokens.len() >= n && matches_at(&tokens, 0, term) {
                    tokens.drain(..n);
                }

                if positions.middle {
                    let mut i = 0;
                    while i + n <= tokens.len() {
                        if matches_at(&tokens, i, term) {
                            tokens.drain(i..i + n);
                        } else {
                            i += 1;
                        }
                    }
                }
            }

            if tokens.len() == before {
                break;
            }
        }

        let stripped = tokens.join(" ");
        if stripped != text {
            trace!(target: TARGET_ENTITY, "Stripped legal form: '{}' -> '{}'", text, stripped);
        }
        stripped
    }
}

fn matches_at(tokens: &[&str], start: usize, term: &[String]) -> bool {
    start + term.len() <= tokens.len()
        && tokens[start..start + term.len()]
            .iter()
            .zip(term)
            .all(|(token, word)| *token == word.as_str())
}
