// 🏗️ Registry Parser - land-registry extract text → ParcelRecord + EntityRows
//
// Pipeline per document:
//   1. metadata (first-match searches over the full text)
//   2. role blocks: Savininkas, Nuomininkas, Patikėtinis (line scanner)
//   3. permit holders: every "Panaudos gavėjas" match anywhere
// Nothing here fails on odd input: unmatched patterns give empty strings.

use crate::entities::{EntityRow, ParcelRecord, ProjectInfo, Role};
use crate::entry::parse_entry;
use crate::pdf::TextSource;
use crate::role_block::scan_role_block;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

// ============================================================================
// PATTERNS
// ============================================================================

static REGISTRY_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Registro Nr\.:?\s*([^\n]+)").expect("registry pattern"));

static UNIQUE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Unikalus daikto numeris:?\s*([^\n]+)").expect("unique pattern"));

static COMPILED_ON_FRAGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Sudarymo data:[^\n]*").expect("compiled-on pattern"));

static CADASTRAL_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pavadinimas:?\s*([^\n]+)").expect("cadastral pattern"));

static CADASTRAL_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+/\d+:\d+").expect("cadastral token pattern"));

static TERRITORY_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Teritorija:\s*").expect("territory pattern"));

static PERMIT_HOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Panaudos gavėjas:?\s*([^\n]+)").expect("permit holder pattern"));

const COMPILED_ON_LABEL: &str = "Sudarymo data:";

// ============================================================================
// PARSED DOCUMENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Original filename (provenance for logs)
    pub source_file: String,
    pub parcel: ParcelRecord,
    /// Rows in extraction order (not yet deduplicated)
    pub rows: Vec<EntityRow>,
}

// ============================================================================
// REGISTRY PARSER
// ============================================================================

/// Parses registry extracts read through a TextSource
pub struct RegistryParser<S: TextSource> {
    source: S,
}

impl<S: TextSource> RegistryParser<S> {
    pub fn new(source: S) -> Self {
        RegistryParser { source }
    }

    /// Parser version (for provenance in logs)
    pub fn version(&self) -> &str {
        "1.0.0"
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Read one document and extract its rows
    pub fn parse_file(&self, path: &Path, project: &ProjectInfo) -> Result<ParsedDocument> {
        let text = self.source.extract_text(path)?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.pdf")
            .to_string();

        let mut document = parse_text(&text, project);
        document.source_file = filename;

        debug!(
            file = %document.source_file,
            source = self.source.name(),
            rows = document.rows.len(),
            "Parsed registry extract"
        );

        Ok(document)
    }
}

/// Extract metadata and all role rows from one document's text
pub fn parse_text(text: &str, project: &ProjectInfo) -> ParsedDocument {
    let parcel = extract_metadata(text);

    let mut rows = Vec::new();
    for role in Role::block_roles() {
        rows.extend(extract_block_rows(text, role, &parcel));
    }
    rows.extend(extract_permit_holders(text, &parcel));

    let rows = rows
        .into_iter()
        .map(|row| row.with_project(project))
        .collect();

    ParsedDocument {
        source_file: String::new(),
        parcel,
        rows,
    }
}

// ============================================================================
// METADATA
// ============================================================================

/// Registry number, address, unique number and cadastral number
pub fn extract_metadata(text: &str) -> ParcelRecord {
    let registry_number = first_capture(&REGISTRY_NUMBER_RE, text);

    let unique_raw = first_capture(&UNIQUE_NUMBER_RE, text);
    let unique_number = COMPILED_ON_FRAGMENT_RE
        .replace_all(&unique_raw, "")
        .trim()
        .to_string();

    let cadastral_raw = first_capture(&CADASTRAL_LABEL_RE, text);
    let cadastral_number = match CADASTRAL_TOKEN_RE.find(&cadastral_raw) {
        Some(m) => m.as_str().to_string(),
        None => cadastral_raw,
    };

    ParcelRecord::new(
        registry_number,
        extract_address(text),
        unique_number,
        cadastral_number,
    )
}

/// The line after the first "Sudarymo data:" line, cleaned of the
/// "Teritorija:" label and quotes
fn extract_address(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();

    let Some(pos) = lines.iter().position(|line| line.contains(COMPILED_ON_LABEL)) else {
        return String::new();
    };

    match lines.get(pos + 1) {
        Some(next) => TERRITORY_PREFIX_RE
            .replace(next.trim(), "")
            .replace('"', "")
            .trim()
            .to_string(),
        None => String::new(),
    }
}

fn first_capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

// ============================================================================
// HOLDERS
// ============================================================================

/// Rows of the first `role` block (Owner, Tenant or Trustee)
pub fn extract_block_rows(text: &str, role: Role, parcel: &ParcelRecord) -> Vec<EntityRow> {
    scan_role_block(text.lines(), role)
        .iter()
        .filter_map(|raw| to_row(raw, role, parcel))
        .collect()
}

/// Rows for every "Panaudos gavėjas" occurrence in the text
pub fn extract_permit_holders(text: &str, parcel: &ParcelRecord) -> Vec<EntityRow> {
    PERMIT_HOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        // A capture that ran into the next field is a mis-match
        .filter(|raw| !raw.to_lowercase().contains("sudarymo data"))
        .filter_map(|raw| to_row(raw, Role::PermitHolder, parcel))
        .collect()
}

fn to_row(raw: &str, role: Role, parcel: &ParcelRecord) -> Option<EntityRow> {
    let entry = parse_entry(raw)?;

    Some(EntityRow::new(
        parcel,
        role,
        entry.first_name,
        entry.surname,
        entry.id_or_date,
        entry.entity_type,
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityType;
    use crate::pdf::MemoryTextSource;

    const SAMPLE: &str = "\
NEKILNOJAMOJO TURTO REGISTRO CENTRINIO DUOMENŲ BANKO IŠRAŠAS
Registro Nr.: 44/1234567
Sudarymo data: 2024-05-01
Teritorija: \"Kauno r. sav., Karmėlavos sen., Biruliškių k.\"
Unikalus daikto numeris: 4400-1234-5678 Sudarymo data: 2024-05-01
Kadastro vietovės pavadinimas: 5230/0004:17 Karmėlavos k.v.
Savininkas: Jonas Jonaitis, gim. 1980-01-01
Ona Jonaitienė, gim. 1982-03-04
Lietuvos Respublika, a.k. 111105555
Įregistravimo pagrindas: pirkimo-pardavimo sutartis
Nuomininkas: UAB Forestas, a.k. 123456789
Daikto registravimo žymos
Panaudos gavėjas: Lietuvos Respublika, a.k. 111105555
Panaudos gavėjas: Petras Petraitis, gim. 1955-06-07
";

    #[test]
    fn test_extract_metadata() {
        let parcel = extract_metadata(SAMPLE);
        assert_eq!(parcel.registry_number, "44/1234567");
        assert_eq!(parcel.unique_number, "4400-1234-5678");
        assert_eq!(parcel.cadastral_number, "5230/0004:17");
        assert_eq!(parcel.address, "Kauno r. sav., Karmėlavos sen., Biruliškių k.");
    }

    #[test]
    fn test_metadata_missing_fields_are_empty() {
        let parcel = extract_metadata("visai kitas dokumentas\nbe jokių laukų");
        assert!(parcel.is_empty());
    }

    #[test]
    fn test_cadastral_falls_back_to_raw_capture() {
        let parcel = extract_metadata("Kadastro vietovės pavadinimas: Karmėlavos k.v.");
        assert_eq!(parcel.cadastral_number, "Karmėlavos k.v.");
    }

    #[test]
    fn test_address_requires_following_line() {
        let parcel = extract_metadata("Registro Nr.: 1\nSudarymo data: 2024-05-01");
        assert_eq!(parcel.address, "");
    }

    #[test]
    fn test_address_without_territory_label() {
        let parcel = extract_metadata("Sudarymo data: 2024-05-01\n  Vilniaus m. sav. \n");
        assert_eq!(parcel.address, "Vilniaus m. sav.");
    }

    #[test]
    fn test_owner_block_rows_skip_sentinel() {
        let parcel = extract_metadata(SAMPLE);
        let rows = extract_block_rows(SAMPLE, Role::Owner, &parcel);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].first_name, "Jonas");
        assert_eq!(rows[0].surname, "Jonaitis");
        assert_eq!(rows[1].first_name, "Ona");
        assert!(rows.iter().all(|r| r.first_name != "Lietuvos Respublika"));
    }

    #[test]
    fn test_tenant_block_organization() {
        let parcel = extract_metadata(SAMPLE);
        let rows = extract_block_rows(SAMPLE, Role::Tenant, &parcel);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, Role::Tenant);
        assert_eq!(rows[0].first_name, "UAB Forestas");
        assert_eq!(rows[0].surname, "");
        assert_eq!(rows[0].id_or_date, "123456789");
        assert_eq!(rows[0].entity_type, EntityType::Organization);
    }

    #[test]
    fn test_missing_role_gives_no_rows() {
        let parcel = extract_metadata(SAMPLE);
        assert!(extract_block_rows(SAMPLE, Role::Trustee, &parcel).is_empty());
    }

    #[test]
    fn test_permit_holders_all_occurrences() {
        let parcel = extract_metadata(SAMPLE);
        let rows = extract_permit_holders(SAMPLE, &parcel);

        // Sentinel dropped, the individual kept
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, Role::PermitHolder);
        assert_eq!(rows[0].first_name, "Petras");
        assert_eq!(rows[0].surname, "Petraitis");
        assert_eq!(rows[0].id_or_date, "1955-06-07");
    }

    #[test]
    fn test_permit_holder_capture_into_next_field_is_skipped() {
        let text = "Panaudos gavėjas:\nSudarymo data: 2024-01-01";
        let rows = extract_permit_holders(text, &ParcelRecord::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_text_attaches_parcel_and_project() {
        let project = ProjectInfo::new("VE7".to_string(), "P-01".to_string(), "Vėjo parkas".to_string());
        let document = parse_text(SAMPLE, &project);

        assert_eq!(document.rows.len(), 4);
        for row in &document.rows {
            assert_eq!(row.parcel, document.parcel);
            assert_eq!(row.project.plant_number, "VE7");
        }
    }

    #[test]
    fn test_single_owner_line() {
        let document = parse_text(
            "Savininkas: Jonas Jonaitis, gim. 1980-01-01",
            &ProjectInfo::default(),
        );
        assert_eq!(document.rows.len(), 1);
        let row = &document.rows[0];
        assert_eq!(row.role, Role::Owner);
        assert_eq!(row.first_name, "Jonas");
        assert_eq!(row.surname, "Jonaitis");
        assert_eq!(row.id_or_date, "1980-01-01");
        assert_eq!(row.entity_type, EntityType::Individual);
    }

    #[test]
    fn test_registry_parser_uses_text_source() {
        let mut source = MemoryTextSource::new();
        source.insert("dir/extract.pdf", SAMPLE);
        let parser = RegistryParser::new(source);

        let document = parser
            .parse_file(Path::new("dir/extract.pdf"), &ProjectInfo::default())
            .unwrap();
        assert_eq!(document.source_file, "extract.pdf");
        assert_eq!(document.parcel.registry_number, "44/1234567");
    }
}
