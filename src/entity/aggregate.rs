use std::collections::BTreeMap;
use tracing::info;

use super::types::{ResolvedEntity, ResolvedRecord};
use super::TARGET_ENTITY;

/// Fold resolved records into one entity per resolved name.
///
/// Entities come out sorted by name; observed names and identifiers are
/// de-duplicated sets.
pub fn aggregate(records: &[ResolvedRecord]) -> Vec<ResolvedEntity> {
    let mut groups: BTreeMap<&str, ResolvedEntity> = BTreeMap::new();

    for resolved in records {
        let entity = groups
            .entry(&resolved.resolved_entity_name)
            .or_insert_with(|| ResolvedEntity::new(&resolved.resolved_entity_name));
        let record = &resolved.keyed.record;
        entity.observed_names.insert(record.raw_name.clone());
        entity.observed_identifiers.insert(record.raw_identifier.clone());
    }

    let entities: Vec<ResolvedEntity> = groups.into_values().collect();
    info!(
        target: TARGET_ENTITY,
        "Aggregated {} records into {} entities",
        records.len(),
        entities.len()
    );
    entities
}
