use std::fs;
use std::path::Path;

use coalesce::pipeline::{process_duplicate_removal, process_entity_resolution};
use coalesce::table::{
    read_rows, write_dedup_file, write_resolution_file, DEDUP_OUTPUT_FILE, RESOLUTION_OUTPUT_FILE,
};
use coalesce::{ResolveError, ResolverConfig};

const INPUT: &str = "\
ref,name,iban,amount
a1,Acme Corp,DE001,10.00
a2,ACME GMBH,DE002,20.00
a3,acme,DE003,30.00
g1,Ghost Ltd,XX,40.00
a4,acme corp.,DE001,50.00
b1,,DE009,60.00
";

fn config() -> ResolverConfig {
    ResolverConfig {
        invalid_sentinel: "XX".to_string(),
        ..Default::default()
    }
}

fn write_input(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("input.csv");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_full_run_through_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), INPUT);
    let config = config();

    let table = read_rows(&input, &config).unwrap();
    assert_eq!(table.rows.len(), 6);

    let (deduplicated, stats) = process_duplicate_removal(table.rows, &config).unwrap();
    assert_eq!(stats.input, 6);
    assert_eq!(stats.kept(), 3);
    write_dedup_file(dir.path(), &table.layout, &deduplicated).unwrap();

    let dedup = fs::read_to_string(dir.path().join(DEDUP_OUTPUT_FILE)).unwrap();
    assert_eq!(
        dedup,
        "ref,name,iban,amount,normalized_name\n\
         a1,Acme Corp,DE001,10.00,acme corp\n\
         a2,ACME GMBH,DE002,20.00,acme gmbh\n\
         a3,acme,DE003,30.00,acme\n"
    );

    let resolution = process_entity_resolution(deduplicated, &config).unwrap();
    assert_eq!(resolution.universe_size, 1);
    write_resolution_file(dir.path(), &config, &resolution.entities).unwrap();

    let resolved = fs::read_to_string(dir.path().join(RESOLUTION_OUTPUT_FILE)).unwrap();
    let mut reader = csv::Reader::from_reader(resolved.as_bytes());
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        vec!["company", "name", "iban"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "Acme");

    let names: Vec<String> = serde_json::from_str(&rows[0][1]).unwrap();
    assert_eq!(names, vec!["ACME GMBH", "Acme Corp", "acme"]);
    let identifiers: Vec<String> = serde_json::from_str(&rows[0][2]).unwrap();
    assert_eq!(identifiers, vec!["DE001", "DE002", "DE003"]);
    assert!(!resolved.contains("Ghost"));
}

#[test]
fn test_custom_columns() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "supplier,account\nGlobex GmbH,FR7630006000011234567890189\nGlobex,FR7630006000011234567890100\n",
    );
    let config = ResolverConfig {
        name_column: "supplier".to_string(),
        identifier_column: "account".to_string(),
        entity_column: "entity".to_string(),
        ..config()
    };

    let table = read_rows(&input, &config).unwrap();
    let (deduplicated, _) = process_duplicate_removal(table.rows, &config).unwrap();
    let resolution = process_entity_resolution(deduplicated, &config).unwrap();
    write_resolution_file(dir.path(), &config, &resolution.entities).unwrap();

    let resolved = fs::read_to_string(dir.path().join(RESOLUTION_OUTPUT_FILE)).unwrap();
    assert!(resolved.starts_with("entity,supplier,account\n"));
    assert_eq!(resolution.entities.len(), 1);
    assert_eq!(resolution.entities[0].name, "Globex");
}

#[test]
fn test_missing_identifier_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "name,amount\nAcme,1\n");

    let err = read_rows(&input, &config()).unwrap_err();
    assert!(matches!(err, ResolveError::MissingColumn { ref column } if column == "iban"));
}

#[test]
fn test_all_rows_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "name,iban\nGhost,XX\n,DE001\n");
    let config = config();

    let table = read_rows(&input, &config).unwrap();
    let (deduplicated, stats) = process_duplicate_removal(table.rows, &config).unwrap();
    assert!(deduplicated.is_empty());
    assert_eq!(stats.invalid, 1);
    assert_eq!(stats.missing, 1);

    assert!(matches!(
        process_entity_resolution(deduplicated, &config),
        Err(ResolveError::EmptyCanonicalUniverse)
    ));
}
