// 🏭 Extraction Pipeline - source directories → output.csv → aggregated table
//
// One directory at a time, one document at a time. Anything unreadable is
// logged and skipped; a directory that fails as a whole is recorded and the
// batch moves on. Only the aggregation write can fail the run.

use crate::deduplication::DeduplicationEngine;
use crate::parser::RegistryParser;
use crate::pdf::TextSource;
use crate::project_info::read_project_info;
use crate::table::{aggregate_tables, write_table, OUTPUT_FILE_NAME};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// REPORTS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectoryReport {
    pub dir: PathBuf,

    /// Documents parsed successfully
    pub documents: usize,

    /// Documents that could not be read
    pub skipped: usize,

    /// Rows before deduplication
    pub extracted_rows: usize,

    /// Rows written
    pub unique_rows: usize,

    /// `output.csv` path, `None` when the directory had no PDFs
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractSummary {
    pub directories: Vec<DirectoryReport>,

    /// Directories that did not exist
    pub missing_dirs: Vec<PathBuf>,

    /// Directories that could not be processed, with the error
    pub failed_dirs: Vec<(PathBuf, String)>,

    pub aggregated: Option<PathBuf>,
}

impl ExtractSummary {
    pub fn total_documents(&self) -> usize {
        self.directories.iter().map(|d| d.documents).sum()
    }

    pub fn total_rows(&self) -> usize {
        self.directories.iter().map(|d| d.unique_rows).sum()
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        self.directories.iter().filter_map(|d| d.output.clone()).collect()
    }
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// `*.pdf` files of a directory (extension case-insensitive), by file name
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }

    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

// ============================================================================
// EXTRACTOR
// ============================================================================

pub struct Extractor<S: TextSource> {
    parser: RegistryParser<S>,
}

impl<S: TextSource> Extractor<S> {
    pub fn new(source: S) -> Self {
        Extractor {
            parser: RegistryParser::new(source),
        }
    }

    /// Parse every PDF of `dir` and write `<dir>/output.csv`
    pub fn process_directory(&self, dir: &Path) -> Result<DirectoryReport> {
        let mut report = DirectoryReport {
            dir: dir.to_path_buf(),
            ..Default::default()
        };

        let pdfs = find_pdfs(dir)?;
        if pdfs.is_empty() {
            warn!(dir = %dir.display(), "No PDF files found");
            return Ok(report);
        }

        let project = read_project_info(dir);
        let mut engine = DeduplicationEngine::new();

        for pdf in &pdfs {
            match self.parser.parse_file(pdf, &project) {
                Ok(document) => {
                    info!(
                        file = %document.source_file,
                        rows = document.rows.len(),
                        "Processed document"
                    );
                    report.documents += 1;
                    engine.extend(document.rows);
                }
                Err(e) => {
                    warn!(path = %pdf.display(), error = %e, "Skipping unreadable document");
                    report.skipped += 1;
                }
            }
        }

        let dedup = engine.report();
        report.extracted_rows = dedup.input_rows;
        report.unique_rows = dedup.unique_rows;

        let output = dir.join(OUTPUT_FILE_NAME);
        write_table(&output, &engine.into_rows())?;
        info!(
            path = %output.display(),
            rows = report.unique_rows,
            duplicates = dedup.duplicates_removed(),
            "Table written"
        );

        report.output = Some(output);
        Ok(report)
    }

    /// Process all directories, then aggregate into `stage_dir` if given
    pub fn run(&self, dirs: &[PathBuf], stage_dir: Option<&Path>) -> Result<ExtractSummary> {
        let mut summary = ExtractSummary::default();

        for dir in dirs {
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "Directory does not exist, skipping");
                summary.missing_dirs.push(dir.clone());
                continue;
            }

            info!(dir = %dir.display(), source = self.parser.source().name(), "Processing directory");
            match self.process_directory(dir) {
                Ok(report) => summary.directories.push(report),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Failed to process directory, skipping");
                    summary.failed_dirs.push((dir.clone(), format!("{:#}", e)));
                }
            }
        }

        match stage_dir {
            Some(stage) => {
                summary.aggregated = aggregate_tables(&summary.outputs(), stage)?;
            }
            None => info!("No stage directory configured, skipping aggregation"),
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::MemoryTextSource;
    use crate::table::{col, read_table};
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"%PDF").unwrap();
    }

    #[test]
    fn test_find_pdfs_sorted_and_case_insensitive() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("b.PDF"));
        touch(&dir.path().join("a.pdf"));
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let pdfs = find_pdfs(dir.path()).unwrap();
        let names: Vec<_> = pdfs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn test_directory_without_pdfs_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let extractor = Extractor::new(MemoryTextSource::new());

        let report = extractor.process_directory(dir.path()).unwrap();
        assert!(report.output.is_none());
        assert!(!dir.path().join(OUTPUT_FILE_NAME).exists());
    }

    #[test]
    fn test_unreadable_document_is_skipped() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("a.pdf");
        let bad = dir.path().join("b.pdf");
        touch(&good);
        touch(&bad);

        let mut source = MemoryTextSource::new();
        source.insert(&good, "Registro Nr.: 44/1\nSavininkas: Jonas Jonaitis, gim. 1980-01-01\n");
        let extractor = Extractor::new(source);

        let report = extractor.process_directory(dir.path()).unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.skipped, 1);

        let records = read_table(&report.output.unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1][0], "44/1");
    }

    #[test]
    fn test_missing_directory_is_reported() {
        let extractor = Extractor::new(MemoryTextSource::new());
        let summary = extractor
            .run(&[PathBuf::from("/definitely/not/here")], None)
            .unwrap();
        assert_eq!(summary.missing_dirs.len(), 1);
        assert!(summary.directories.is_empty());
        assert!(summary.aggregated.is_none());
    }

    const EXTRACT: &str = "\
Registro Nr.: 44/7
Sudarymo data: 2024-05-01
Biruliškių k.
Savininkas: Jonas Jonaitis, gim. 1980-01-01
Nuomininkas: Lietuvos Respublika, a.k. 111105555
UAB Vėjas, a.k. 300000000
Pagrindas: nuomos sutartis
Patikėtinis: Lietuvos Respublika, a.k. 111105555
Ona Jonaitienė, gim. 1982-03-04
";

    fn directory_with(text: &str) -> (TempDir, Extractor<MemoryTextSource>) {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("a.pdf");
        touch(&pdf);

        let mut source = MemoryTextSource::new();
        source.insert(&pdf, text);
        (dir, Extractor::new(source))
    }

    #[test]
    fn test_sentinel_dropped_under_tenant_and_trustee() {
        let (dir, extractor) = directory_with(EXTRACT);

        let report = extractor.process_directory(dir.path()).unwrap();
        let records = read_table(&report.output.unwrap()).unwrap();

        assert!(records.iter().all(|r| r.iter().all(|c| c != "Lietuvos Respublika")));
        let holders: Vec<(&str, &str)> = records[1..]
            .iter()
            .map(|r| (r[4].as_str(), r[col::FIRST_NAME].as_str()))
            .collect();
        assert!(holders.contains(&("Nuomininkas", "UAB Vėjas")));
        assert!(holders.contains(&("Patikėtinis", "Ona")));
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_repeated_run_writes_identical_bytes() {
        let (dir, extractor) = directory_with(EXTRACT);
        let output = dir.path().join(OUTPUT_FILE_NAME);

        extractor.process_directory(dir.path()).unwrap();
        let first = fs::read(&output).unwrap();
        extractor.process_directory(dir.path()).unwrap();
        let second = fs::read(&output).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_failing_directory_does_not_stop_the_batch() {
        let (broken, broken_extractor) = directory_with(EXTRACT);
        // output.csv cannot be written over a directory
        fs::create_dir(broken.path().join(OUTPUT_FILE_NAME)).unwrap();
        let summary = broken_extractor
            .run(&[broken.path().to_path_buf()], None)
            .unwrap();
        assert_eq!(summary.failed_dirs.len(), 1);
        assert!(summary.directories.is_empty());

        let good = TempDir::new().unwrap();
        let good_pdf = good.path().join("a.pdf");
        touch(&good_pdf);
        let mut source = MemoryTextSource::new();
        source.insert(broken.path().join("a.pdf"), EXTRACT);
        source.insert(&good_pdf, EXTRACT);

        let summary = Extractor::new(source)
            .run(&[broken.path().to_path_buf(), good.path().to_path_buf()], None)
            .unwrap();
        assert_eq!(summary.failed_dirs[0].0, broken.path());
        assert_eq!(summary.directories.len(), 1);
        assert!(good.path().join(OUTPUT_FILE_NAME).is_file());
    }
}
