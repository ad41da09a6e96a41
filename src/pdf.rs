// 📄 Text Sources - where the extractor's input text comes from
//
// Production reads PDFs with pdf-extract; tests feed text directly.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// TextSource - turns one source document into its full text
pub trait TextSource {
    fn extract_text(&self, path: &Path) -> Result<String>;

    /// Short name for logs
    fn name(&self) -> &str;
}

// ============================================================================
// PDF
// ============================================================================

/// Full text of a PDF via pdf-extract
pub struct PdfTextSource;

impl PdfTextSource {
    pub fn new() -> Self {
        PdfTextSource
    }
}

impl Default for PdfTextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for PdfTextSource {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read PDF file: {}", path.display()))?;

        let text = pdf_extract::extract_text_from_mem(&bytes)
            .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;

        Ok(normalize_text(&text))
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}

/// Drop NUL/BOM artifacts and normalize line endings; line structure is kept
/// because the role scanner is line based
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{0}', "")
        .replace('\u{FEFF}', "")
        .replace('\u{000C}', "\n")
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Text keyed by path; used by tests and dry runs over pre-extracted text
#[derive(Default)]
pub struct MemoryTextSource {
    texts: HashMap<PathBuf, String>,
}

impl MemoryTextSource {
    pub fn new() -> Self {
        MemoryTextSource::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.texts.insert(path.into(), text.into());
    }
}

impl TextSource for MemoryTextSource {
    fn extract_text(&self, path: &Path) -> Result<String> {
        self.texts
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No text registered for {}", path.display()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
