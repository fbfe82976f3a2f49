//! Stage drivers.
//!
//! `process_duplicate_removal` feeds `process_entity_resolution`; each stage
//! consumes the full output of the previous one.

use std::time::Instant;
use tracing::info;

use crate::config::ResolverConfig;
use crate::entity::aggregate::aggregate;
use crate::entity::canonical::CanonicalKeyBuilder;
use crate::entity::dedup::{DuplicateFilter, FilterStats};
use crate::entity::matching::EntityMatcher;
use crate::entity::types::{RawRecord, Record, Resolution};
use crate::error::Result;
use crate::TARGET_PIPELINE;

/// Drop anomalies and exact duplicates.
pub fn process_duplicate_removal(
    rows: Vec<RawRecord>,
    config: &ResolverConfig,
) -> Result<(Vec<Record>, FilterStats)> {
    config.validate()?;
    let filter = DuplicateFilter::new(&config.invalid_sentinel);
    Ok(filter.filter(rows))
}

/// Key, match and group deduplicated records.
///
/// Fails with `EmptyCanonicalUniverse` when there is nothing to match against.
pub fn process_entity_resolution(records: Vec<Record>, config: &ResolverConfig) -> Result<Resolution> {
    config.validate()?;
    let start = Instant::now();

    let builder = CanonicalKeyBuilder::from_config(config);
    let (keyed, universe) = builder.build(records)?;

    let matcher = EntityMatcher::from_config(&universe, config)?;
    let resolved = matcher.resolve(keyed, config.query_key, config.threads)?;
    let entities = aggregate(&resolved);

    info!(
        target: TARGET_PIPELINE,
        "Resolved {} records into {} entities in {:.2?}",
        resolved.len(),
        entities.len(),
        start.elapsed()
    );

    Ok(Resolution {
        records: resolved,
        entities,
        universe_size: universe.len(),
    })
}

/// Both stages back to back.
pub fn run(rows: Vec<RawRecord>, config: &ResolverConfig) -> Result<(Vec<Record>, Resolution)> {
    let (deduplicated, _) = process_duplicate_removal(rows, config)?;
    let resolution = process_entity_resolution(deduplicated.clone(), config)?;
    Ok((deduplicated, resolution))
}
