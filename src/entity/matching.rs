//! Nearest-canonical assignment.
//!
//! Every record is scored against every key of the canonical universe and
//! assigned the best one. Ties go to the key that comes first in the
//! universe's sorted order. The pruned strategy reaches the same answer while
//! skipping candidates whose score bound shows they cannot win.

use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, trace};

use super::canonical::CanonicalUniverse;
use super::similarity::{score_prepared, score_upper_bound, PreparedKey, SimilarityMetric};
use super::types::{KeyedRecord, ResolvedRecord};
use super::TARGET_ENTITY;
use crate::config::{MatchStrategy, QueryKey, ResolverConfig};
use crate::error::{ResolveError, Result};

/// Best candidate for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    // Index into the universe's sorted keys
    pub index: usize,
    pub score: u8,
    // Candidates that were fully scored
    pub scored: usize,
}

pub struct EntityMatcher<'u> {
    universe: &'u CanonicalUniverse,
    prepared: Vec<PreparedKey>,
    buckets: HashMap<String, Vec<usize>>,
    metric: SimilarityMetric,
    strategy: MatchStrategy,
}

impl<'u> EntityMatcher<'u> {
    /// Prepare a matcher over a fixed universe.
    ///
    /// An empty universe is a precondition failure: nothing could be matched.
    pub fn new(
        universe: &'u CanonicalUniverse,
        metric: SimilarityMetric,
        strategy: MatchStrategy,
    ) -> Result<Self> {
        if universe.is_empty() {
            return Err(ResolveError::EmptyCanonicalUniverse);
        }

        let prepared: Vec<PreparedKey> = universe.keys().iter().map(|k| PreparedKey::new(k)).collect();

        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, key) in prepared.iter().enumerate() {
            if let Some(lead) = key.lead_token() {
                buckets.entry(lead.to_string()).or_default().push(index);
            }
        }

        debug!(
            target: TARGET_ENTITY,
            "Matcher ready: {} candidates in {} buckets, metric={}, strategy={:?}",
            prepared.len(), buckets.len(), metric, strategy
        );

        Ok(Self {
            universe,
            prepared,
            buckets,
            metric,
            strategy,
        })
    }

    pub fn from_config(universe: &'u CanonicalUniverse, config: &ResolverConfig) -> Result<Self> {
        Self::new(universe, config.metric, config.strategy)
    }

    /// Find the best canonical key for a query string.
    pub fn best_match(&self, query: &str) -> MatchOutcome {
        let query = PreparedKey::new(query);
        match self.strategy {
            MatchStrategy::BruteForce => self.brute_force(&query),
            MatchStrategy::Pruned => self.pruned(&query),
        }
    }

    /// The matched canonical key itself.
    pub fn match_key(&self, query: &str) -> &'u str {
        &self.universe.keys()[self.best_match(query).index]
    }

    fn brute_force(&self, query: &PreparedKey) -> MatchOutcome {
        let mut best = MatchOutcome {
            index: 0,
            score: score_prepared(self.metric, query, &self.prepared[0]),
            scored: 1,
        };

        for (index, candidate) in self.prepared.iter().enumerate().skip(1) {
            let score = score_prepared(self.metric, query, candidate);
            best.scored += 1;
            // Strictly greater: the first maximum wins
            if score > best.score {
                best.index = index;
                best.score = score;
            }
        }

        best
    }

    fn pruned(&self, query: &PreparedKey) -> MatchOutcome {
        let mut best: Option<MatchOutcome> = None;
        let mut scored = 0;

        // Candidates sharing the query's lead token usually score highest,
        // so scoring them first raises the bar for everything else
        let lead = query.lead_token();
        if let Some(seeds) = lead.and_then(|token| self.buckets.get(token)) {
            for &index in seeds {
                self.consider(query, index, &mut best, &mut scored);
            }
        }

        for (index, candidate) in self.prepared.iter().enumerate() {
            if lead.is_some() && candidate.lead_token() == lead {
                continue;
            }
            self.consider(query, index, &mut best, &mut scored);
        }

        match best {
            Some(outcome) => MatchOutcome { scored, ..outcome },
            // Universe is never empty here
            None => MatchOutcome {
                index: 0,
                score: 0,
                scored,
            },
        }
    }

    fn consider(
        &self,
        query: &PreparedKey,
        index: usize,
        best: &mut Option<MatchOutcome>,
        scored: &mut usize,
    ) {
        let candidate = &self.prepared[index];

        if let Some(current) = best {
            let bound = score_upper_bound(self.metric, query, candidate);
            if bound < current.score || (bound == current.score && index > current.index) {
                return;
            }
        }

        let score = score_prepared(self.metric, query, candidate);
        *scored += 1;

        let wins = match best {
            None => true,
            Some(current) => score > current.score || (score == current.score && index < current.index),
        };
        if wins {
            *best = Some(MatchOutcome {
                index,
                score,
                scored: 0,
            });
        }
    }

    /// Assign every record its resolved entity.
    ///
    /// Identical query keys are matched once. Distinct queries are matched in
    /// parallel against the shared, read-only universe; the output keeps the
    /// input order.
    pub fn resolve(
        &self,
        records: Vec<KeyedRecord>,
        query_key: QueryKey,
        threads: Option<usize>,
    ) -> Result<Vec<ResolvedRecord>> {
        let start = Instant::now();

        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut distinct: Vec<&str> = Vec::new();
        let record_slots: Vec<usize> = records
            .iter()
            .map(|record| {
                let query = query_for(record, query_key);
                *slots.entry(query).or_insert_with(|| {
                    distinct.push(query);
                    distinct.len() - 1
                })
            })
            .collect();

        let sweep = || -> Vec<MatchOutcome> { distinct.par_iter().map(|query| self.best_match(query)).collect() };
        let outcomes = match threads {
            Some(count) => rayon::ThreadPoolBuilder::new()
                .num_threads(count)
                .build()
                .map_err(|e| ResolveError::ThreadPool(e.to_string()))?
                .install(sweep),
            None => sweep(),
        };

        let scored: usize = outcomes.iter().map(|o| o.scored).sum();
        let distinct_count = distinct.len();
        let total_pairs = distinct_count * self.prepared.len();

        for (query, outcome) in distinct.iter().zip(&outcomes) {
            trace!(
                target: TARGET_ENTITY,
                "Matched '{}' -> '{}' (score {})", query, self.universe.keys()[outcome.index], outcome.score
            );
        }

        let resolved: Vec<ResolvedRecord> = records
            .into_iter()
            .zip(record_slots)
            .map(|(keyed, slot)| {
                let matched_key = self.universe.keys()[outcomes[slot].index].clone();
                ResolvedRecord {
                    keyed,
                    resolved_entity_name: display_name(&matched_key),
                    matched_key,
                }
            })
            .collect();

        info!(
            target: TARGET_ENTITY,
            "Matched {} records ({} distinct queries) against {} keys in {:.2?}, scored {} of {} pairs",
            resolved.len(),
            distinct_count,
            self.prepared.len(),
            start.elapsed(),
            scored,
            total_pairs
        );

        Ok(resolved)
    }
}

fn query_for(record: &KeyedRecord, query_key: QueryKey) -> &str {
    match query_key {
        QueryKey::Full => &record.full_key,
        QueryKey::Candidate => &record.canonical_candidate_key,
    }
}

/// Match one query against a universe and return the display name.
pub fn match_entity(query: &str, universe: &CanonicalUniverse, metric: SimilarityMetric) -> Result<String> {
    let matcher = EntityMatcher::new(universe, metric, MatchStrategy::default())?;
    Ok(display_name(matcher.match_key(query)))
}

/// Display name for a canonical key: drop the trailing identifier token and
/// capitalize the first letter.
pub fn display_name(key: &str) -> String {
    let tokens: Vec<&str> = key.split_whitespace().collect();
    let name = tokens[..tokens.len().saturating_sub(1)].join(" ");

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
