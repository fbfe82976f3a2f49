use std::collections::BTreeSet;

/// One input row as handed over by the table boundary.
///
/// `name` and `identifier` are `None` when the cell was empty or missing.
/// Every other column is carried along in `extra`, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    // Zero-based position in the input, used for stable ordering
    pub position: usize,
    pub name: Option<String>,
    pub identifier: Option<String>,
    pub extra: Vec<String>,
}

impl RawRecord {
    pub fn new(position: usize, name: &str, identifier: &str) -> Self {
        RawRecord {
            position,
            name: Some(name.to_string()),
            identifier: Some(identifier.to_string()),
            extra: Vec::new(),
        }
    }

    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }
}

/// A row that survived duplicate removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub position: usize,
    pub raw_name: String,
    pub raw_identifier: String,
    // Lowercase, word characters and single spaces only
    pub normalized_name: String,
    pub extra: Vec<String>,
}

impl From<Record> for RawRecord {
    fn from(record: Record) -> Self {
        RawRecord {
            position: record.position,
            name: Some(record.raw_name),
            identifier: Some(record.raw_identifier),
            extra: record.extra,
        }
    }
}

/// A deduplicated row enriched with its matching keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedRecord {
    pub record: Record,
    pub suffix_stripped_name: String,
    pub truncated_identifier: String,
    // normalized_name + " " + raw_identifier
    pub full_key: String,
    // suffix_stripped_name + " " + truncated_identifier
    pub canonical_candidate_key: String,
}

/// A keyed row with the entity it was assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    pub keyed: KeyedRecord,
    pub matched_key: String,
    pub resolved_entity_name: String,
}

/// One resolved real-world company/account family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEntity {
    pub name: String,
    pub observed_names: BTreeSet<String>,
    pub observed_identifiers: BTreeSet<String>,
}

impl ResolvedEntity {
    pub fn new(name: &str) -> Self {
        ResolvedEntity {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Output of the resolution stage.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub records: Vec<ResolvedRecord>,
    pub entities: Vec<ResolvedEntity>,
    pub universe_size: usize,
}
