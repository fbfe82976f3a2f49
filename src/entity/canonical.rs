use std::collections::BTreeSet;
use tracing::{info, warn};

use super::business_terms::{BusinessTerms, TermPositions};
use super::normalizer::{strip_business_terms, truncate_identifier, try_truncate_identifier};
use super::types::{KeyedRecord, Record};
use super::TARGET_ENTITY;
use crate::config::ResolverConfig;
use crate::error::Result;

/// The fixed pool of canonical keys every record is matched against.
///
/// Keys are distinct and sorted, so enumeration order (and with it the
/// matcher's tie-break) does not depend on input order or hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalUniverse {
    keys: Vec<String>,
}

impl CanonicalUniverse {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        CanonicalUniverse {
            keys: unique.into_iter().collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.binary_search_by(|k| k.as_str().cmp(key)).is_ok()
    }
}

/// Derives matching keys per record and the canonical universe.
pub struct CanonicalKeyBuilder {
    lexicon: BusinessTerms,
    positions: TermPositions,
    strict_identifiers: bool,
}

impl CanonicalKeyBuilder {
    pub fn new(lexicon: BusinessTerms, positions: TermPositions) -> Self {
        Self {
            lexicon,
            positions,
            strict_identifiers: false,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.lexicon(), config.term_positions).with_strict_identifiers(config.strict_identifiers)
    }

    pub fn with_strict_identifiers(mut self, strict: bool) -> Self {
        self.strict_identifiers = strict;
        self
    }

    /// Enrich one record with its keys.
    pub fn key_record(&self, record: Record) -> Result<KeyedRecord> {
        let suffix_stripped_name = strip_business_terms(&record.normalized_name, &self.lexicon, self.positions);
        let truncated_identifier = if self.strict_identifiers {
            try_truncate_identifier(&record.raw_identifier)?
        } else {
            truncate_identifier(&record.raw_identifier)
        };

        let full_key = format!("{} {}", record.normalized_name, record.raw_identifier);
        let canonical_candidate_key = format!("{} {}", suffix_stripped_name, truncated_identifier);

        Ok(KeyedRecord {
            record,
            suffix_stripped_name,
            truncated_identifier,
            full_key,
            canonical_candidate_key,
        })
    }

    /// Key every record and collect the distinct candidate keys.
    pub fn build(&self, records: Vec<Record>) -> Result<(Vec<KeyedRecord>, CanonicalUniverse)> {
        let keyed = records
            .into_iter()
            .map(|record| self.key_record(record))
            .collect::<Result<Vec<_>>>()?;

        let degenerate = keyed
            .iter()
            .filter(|k| k.suffix_stripped_name.is_empty() || k.truncated_identifier.is_empty())
            .count();
        if degenerate > 0 {
            warn!(
                target: TARGET_ENTITY,
                "{} records have an empty name or identifier key and will match poorly", degenerate
            );
        }

        let universe = CanonicalUniverse::new(keyed.iter().map(|k| k.canonical_candidate_key.clone()));
        info!(
            target: TARGET_ENTITY,
            "Built canonical universe of {} keys from {} records",
            universe.len(),
            keyed.len()
        );

        Ok((keyed, universe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::normalizer::normalize;
    use crate::error::ResolveError;

    fn record(position: usize, name: &str, identifier: &str) -> Record {
        Record {
            position,
            raw_name: name.to_string(),
            raw_identifier: identifier.to_string(),
            normalized_name: normalize(name),
            extra: Vec::new(),
        }
    }

    fn builder() -> CanonicalKeyBuilder {
        CanonicalKeyBuilder::new(BusinessTerms::builtin().clone(), TermPositions::default())
    }

    #[test]
    fn test_record_keys() {
        let keyed = builder().key_record(record(0, "Acme Corp", "DE001")).unwrap();
        assert_eq!(keyed.suffix_stripped_name, "acme");
        assert_eq!(keyed.truncated_identifier, "DE0");
        assert_eq!(keyed.full_key, "acme corp DE001");
        assert_eq!(keyed.canonical_candidate_key, "acme DE0");
    }

    #[test]
    fn test_universe_is_distinct_and_sorted() {
        let (keyed, universe) = builder()
            .build(vec![
                record(0, "Zeta GmbH", "DE991"),
                record(1, "Acme Corp", "DE001"),
                record(2, "ACME GMBH", "DE002"),
                record(3, "acme", "DE003"),
            ])
            .unwrap();

        assert_eq!(keyed.len(), 4);
        assert_eq!(universe.keys(), &["acme DE0", "zeta DE9"]);
        assert!(universe.contains("zeta DE9"));
        assert!(!universe.contains("acme"));
    }

    #[test]
    fn test_distinctness_is_exact() {
        let (_, universe) = builder()
            .build(vec![record(0, "Acme", "DE001"), record(1, "Acmee", "DE001")])
            .unwrap();
        assert_eq!(universe.len(), 2);
    }

    #[test]
    fn test_short_identifier_policy() {
        let keyed = builder().key_record(record(0, "Acme", "X")).unwrap();
        assert_eq!(keyed.truncated_identifier, "");
        assert_eq!(keyed.canonical_candidate_key, "acme ");

        let strict = builder().with_strict_identifiers(true);
        assert!(matches!(
            strict.build(vec![record(0, "Acme", "DE001"), record(1, "Acme", "X")]),
            Err(ResolveError::IdentifierTooShort { .. })
        ));
    }

    #[test]
    fn test_empty_input_gives_empty_universe() {
        let (keyed, universe) = builder().build(Vec::new()).unwrap();
        assert!(keyed.is_empty());
        assert!(universe.is_empty());
    }
}
