// 📊 Output Table - the 14-column CSV shared by extract, enrich and letters
//
// Files are UTF-8 with a BOM (they are opened in spreadsheet tools) and
// comma-delimited. Records are kept as plain string vectors: enrichment and
// letter generation tolerate short or foreign rows, so no typed decoding.

use crate::entities::EntityRow;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const UTF8_BOM: &str = "\u{FEFF}";

/// File name of a directory's table
pub const OUTPUT_FILE_NAME: &str = "output.csv";

/// File name of the cross-directory table
pub const AGGREGATED_FILE_NAME: &str = "aggregated_output.csv";

pub const TABLE_HEADER: [&str; 14] = [
    "Registro Nr",
    "Sklypo adresas",
    "Unikalus Nr",
    "Kadastro Nr",
    "Rolė",
    "Vardas",
    "Pavardė",
    "ĮK/Data",
    "Tipas",
    "Elektrinės Nr",
    "Projekto Nr",
    "Projekto pavadinimas",
    "Deklaruotas adresas",
    "Pašto kodas",
];

pub const COLUMN_COUNT: usize = TABLE_HEADER.len();

/// Column positions used outside the extractor
pub mod col {
    pub const REGISTRY_NUMBER: usize = 0;
    pub const PARCEL_ADDRESS: usize = 1;
    pub const UNIQUE_NUMBER: usize = 2;
    pub const CADASTRAL_NUMBER: usize = 3;
    pub const FIRST_NAME: usize = 5;
    pub const SURNAME: usize = 6;
    pub const ID_OR_DATE: usize = 7;
    pub const ENTITY_TYPE: usize = 8;
    pub const PLANT_NUMBER: usize = 9;
    pub const PROJECT_NUMBER: usize = 10;
    pub const PROJECT_NAME: usize = 11;
    pub const DECLARED_ADDRESS: usize = 12;
    pub const POSTAL_CODE: usize = 13;
}

pub fn header_record() -> Vec<String> {
    TABLE_HEADER.iter().map(|h| h.to_string()).collect()
}

/// True when `record` is the fixed header (BOM on the first cell tolerated)
pub fn is_header(record: &[String]) -> bool {
    record.len() == COLUMN_COUNT
        && record
            .iter()
            .zip(TABLE_HEADER.iter())
            .all(|(cell, label)| cell.trim_start_matches(UTF8_BOM).trim() == *label)
}

/// Pad a record with empty cells up to the full column count
pub fn pad_record(record: &mut Vec<String>) {
    if record.len() < COLUMN_COUNT {
        record.resize(COLUMN_COUNT, String::new());
    }
}

// ============================================================================
// READ
// ============================================================================

/// Read every record of a table, header included, BOM removed
pub fn read_table(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read table: {}", path.display()))?;

    parse_table(&content, b',')
        .with_context(|| format!("Failed to parse table: {}", path.display()))
}

/// Parse delimited text into raw records; rows may differ in length
pub fn parse_table(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.context("Failed to read CSV record")?;
        records.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok(records)
}

// ============================================================================
// WRITE
// ============================================================================

/// Write raw records (caller supplies the header if any) with a BOM
pub fn write_records(path: &Path, records: &[Vec<String>]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create table: {}", path.display()))?;
    file.write_all(UTF8_BOM.as_bytes())?;

    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
    for record in records {
        wtr.write_record(record)
            .with_context(|| format!("Failed to write record to {}", path.display()))?;
    }
    wtr.flush()?;

    Ok(())
}

/// Header + one record per row
pub fn write_table(path: &Path, rows: &[EntityRow]) -> Result<()> {
    let mut records = Vec::with_capacity(rows.len() + 1);
    records.push(header_record());
    records.extend(rows.iter().map(|row| row.to_record()));

    write_records(path, &records)
}

// ============================================================================
// AGGREGATE
// ============================================================================

/// Concatenate per-directory tables keeping the first header only.
/// Returns `None` when the inputs hold no data rows (nothing written).
pub fn aggregate_tables(inputs: &[PathBuf], stage_dir: &Path) -> Result<Option<PathBuf>> {
    let mut header: Option<Vec<String>> = None;
    let mut data: Vec<Vec<String>> = Vec::new();

    for input in inputs {
        let records = match read_table(input) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %input.display(), error = %e, "Skipping unreadable table");
                continue;
            }
        };

        let mut iter = records.into_iter();
        if let Some(first) = iter.next() {
            if header.is_none() {
                header = Some(first);
            }
        }
        data.extend(iter);
    }

    if data.is_empty() {
        info!("No rows to aggregate");
        return Ok(None);
    }

    fs::create_dir_all(stage_dir)
        .with_context(|| format!("Failed to create directory: {}", stage_dir.display()))?;

    let output = stage_dir.join(AGGREGATED_FILE_NAME);
    let mut records = Vec::with_capacity(data.len() + 1);
    records.push(header.unwrap_or_else(header_record));
    records.extend(data);

    write_records(&output, &records)?;
    info!(path = %output.display(), rows = records.len() - 1, "Aggregated table written");

    Ok(Some(output))
}
