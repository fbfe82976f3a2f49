//! CSV boundary.
//!
//! Reads the input table into [`RawRecord`]s and writes the two result
//! tables. Columns other than name and identifier are carried through the
//! dedup stage untouched.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use crate::config::ResolverConfig;
use crate::entity::types::{RawRecord, Record, ResolvedEntity};
use crate::error::{ResolveError, Result};
use crate::TARGET_IO;

pub const DEDUP_OUTPUT_FILE: &str = "duplicate_removal_output.csv";
pub const RESOLUTION_OUTPUT_FILE: &str = "entity_resolution_output.csv";
pub const NORMALIZED_NAME_COLUMN: &str = "normalized_name";

/// Column layout of an input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub header: Vec<String>,
    name_index: usize,
    identifier_index: usize,
}

impl TableLayout {
    pub fn new(header: Vec<String>, config: &ResolverConfig) -> Result<Self> {
        let find = |column: &str| {
            header
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| ResolveError::MissingColumn {
                    column: column.to_string(),
                })
        };
        let name_index = find(&config.name_column)?;
        let identifier_index = find(&config.identifier_column)?;

        Ok(Self {
            header,
            name_index,
            identifier_index,
        })
    }

    fn to_raw(&self, position: usize, row: &csv::StringRecord) -> RawRecord {
        let cell = |index: usize| row.get(index).filter(|v| !v.trim().is_empty()).map(str::to_string);

        let extra = (0..self.header.len())
            .filter(|&i| i != self.name_index && i != self.identifier_index)
            .map(|i| row.get(i).unwrap_or_default().to_string())
            .collect();

        RawRecord {
            position,
            name: cell(self.name_index),
            identifier: cell(self.identifier_index),
            extra,
        }
    }

    // Inverse of `to_raw` for a surviving record, in header order
    fn to_row(&self, record: &Record) -> Vec<String> {
        let mut extra = record.extra.iter();
        (0..self.header.len())
            .map(|i| {
                if i == self.name_index {
                    record.raw_name.clone()
                } else if i == self.identifier_index {
                    record.raw_identifier.clone()
                } else {
                    extra.next().cloned().unwrap_or_default()
                }
            })
            .collect()
    }
}

/// A loaded input table.
#[derive(Debug, Clone)]
pub struct Table {
    pub layout: TableLayout,
    pub rows: Vec<RawRecord>,
}

pub fn read_rows(path: &Path, config: &ResolverConfig) -> Result<Table> {
    let table = read_rows_from(File::open(path)?, config)?;
    info!(
        target: TARGET_IO,
        "Read {} rows with {} columns from {}",
        table.rows.len(),
        table.layout.header.len(),
        path.display()
    );
    Ok(table)
}

pub fn read_rows_from<R: Read>(reader: R, config: &ResolverConfig) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let layout = TableLayout::new(header, config)?;

    let mut rows = Vec::new();
    for (position, result) in reader.records().enumerate() {
        let row = result?;
        rows.push(layout.to_raw(position, &row));
    }

    Ok(Table { layout, rows })
}

/// Input columns in input order plus a trailing `normalized_name` column.
pub fn write_dedup_table<W: Write>(writer: W, layout: &TableLayout, records: &[Record]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = layout.header.clone();
    header.push(NORMALIZED_NAME_COLUMN.to_string());
    writer.write_record(&header)?;

    for record in records {
        let mut row = layout.to_row(record);
        row.push(record.normalized_name.clone());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// One row per entity: resolved name, then observed names and identifiers
/// as JSON arrays sorted lexicographically.
pub fn write_resolution_table<W: Write>(
    writer: W,
    config: &ResolverConfig,
    entities: &[ResolvedEntity],
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([&config.entity_column, &config.name_column, &config.identifier_column])?;

    for entity in entities {
        writer.write_record([
            entity.name.clone(),
            serde_json::to_string(&entity.observed_names)?,
            serde_json::to_string(&entity.observed_identifiers)?,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_dedup_file(folder: &Path, layout: &TableLayout, records: &[Record]) -> Result<()> {
    let path = folder.join(DEDUP_OUTPUT_FILE);
    write_dedup_table(File::create(&path)?, layout, records)?;
    info!(target: TARGET_IO, "Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

pub fn write_resolution_file(folder: &Path, config: &ResolverConfig, entities: &[ResolvedEntity]) -> Result<()> {
    let path = folder.join(RESOLUTION_OUTPUT_FILE);
    write_resolution_table(File::create(&path)?, config, entities)?;
    info!(target: TARGET_IO, "Wrote {} entities to {}", entities.len(), path.display());
    Ok(())
}
