use std::collections::HashSet;
use tracing::{debug, info};

use super::normalizer::normalize;
use super::types::{RawRecord, Record};
use super::TARGET_ENTITY;

/// Counts reported by a filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub input: usize,
    pub missing: usize,
    pub invalid: usize,
    pub duplicates: usize,
}

impl FilterStats {
    pub fn kept(&self) -> usize {
        self.input - self.missing - self.invalid - self.duplicates
    }
}

/// Removes anomalous rows and exact duplicates.
pub struct DuplicateFilter {
    invalid_sentinel: String,
}

impl DuplicateFilter {
    pub fn new(invalid_sentinel: &str) -> Self {
        Self {
            invalid_sentinel: invalid_sentinel.trim().to_string(),
        }
    }

    /// Drop rows with a missing name or identifier or the sentinel
    /// identifier, then drop repeats of `(normalized_name, raw_identifier)`.
    ///
    /// The first occurrence wins and input order is preserved.
    pub fn filter<I>(&self, records: I) -> (Vec<Record>, FilterStats)
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut stats = FilterStats::default();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut kept = Vec::new();

        for raw in records {
            stats.input += 1;

            let (name, identifier) = match (present(raw.name), present(raw.identifier)) {
                (Some(name), Some(identifier)) => (name, identifier),
                _ => {
                    stats.missing += 1;
                    continue;
                }
            };

            if identifier.trim() == self.invalid_sentinel {
                stats.invalid += 1;
                continue;
            }

            let normalized_name = normalize(&name);
            if !seen.insert((normalized_name.clone(), identifier.clone())) {
                debug!(
                    target: TARGET_ENTITY,
                    "Dropping duplicate row {}: '{}' / '{}'", raw.position, name, identifier
                );
                stats.duplicates += 1;
                continue;
            }

            kept.push(Record {
                position: raw.position,
                raw_name: name,
                raw_identifier: identifier,
                normalized_name,
                extra: raw.extra,
            });
        }

        info!(
            target: TARGET_ENTITY,
            "Duplicate filter kept {} of {} rows ({} missing, {} invalid, {} duplicates)",
            stats.kept(), stats.input, stats.missing, stats.invalid, stats.duplicates
        );

        (kept, stats)
    }
}

// A cell counts as present when it has non-whitespace content
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
