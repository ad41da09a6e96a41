// 🔍 Inspect - paragraph, run and table structure of a .docx
//
// Used to debug templates: which run holds a placeholder, which paragraph
// carries the list numbering, how the plot table is laid out.

use crate::docx::content::{run_text, runs};
use crate::docx::{cell_text, paragraph_text, row_cells, table_rows, Document, ParagraphStyle, RunStyle};
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub text: String,
    pub style: RunStyle,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParagraphReport {
    /// 1-based position among body paragraphs, empty ones included
    pub index: usize,
    pub text: String,
    pub style: ParagraphStyle,
    pub runs: Vec<RunReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub index: usize,
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub paragraphs: Vec<ParagraphReport>,
    pub tables: Vec<TableReport>,
}

impl DocumentReport {
    pub fn from_document(doc: &Document) -> Self {
        let paragraphs = doc
            .paragraphs()
            .into_iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let text = paragraph_text(p);
                if text.trim().is_empty() {
                    return None;
                }
                Some(ParagraphReport {
                    index: i + 1,
                    text,
                    style: ParagraphStyle::from_paragraph(p),
                    runs: runs(p)
                        .into_iter()
                        .map(|r| RunReport {
                            text: run_text(r),
                            style: RunStyle::from_run(r),
                        })
                        .collect(),
                })
            })
            .collect();

        let tables = doc
            .tables()
            .into_iter()
            .enumerate()
            .map(|(i, table)| {
                let cells: Vec<Vec<String>> = table_rows(table)
                    .into_iter()
                    .map(|row| {
                        row_cells(row)
                            .into_iter()
                            .map(|cell| cell_text(cell).replace('\n', " "))
                            .collect()
                    })
                    .collect();

                TableReport {
                    index: i + 1,
                    rows: cells.len(),
                    columns: cells.iter().map(Vec::len).max().unwrap_or(0),
                    cells,
                }
            })
            .collect();

        DocumentReport { paragraphs, tables }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_document(&Document::open(path)?))
    }

    /// Human-readable listing
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "-".repeat(50);

        let _ = writeln!(out, "PARAGRAPHS:\n{}", rule);
        for p in &self.paragraphs {
            let _ = writeln!(out, "Para {}: {}", p.index, p.text);
            if p.runs.len() > 1 {
                let _ = writeln!(out, "  - Contains {} runs:", p.runs.len());
                for (j, run) in p.runs.iter().enumerate() {
                    let _ = writeln!(
                        out,
                        "    Run {}: '{}' [Bold: {}, Italic: {}]",
                        j + 1,
                        run.text,
                        flag(run.style.bold),
                        flag(run.style.italic)
                    );
                }
            }
        }

        let _ = writeln!(out, "\nTABLES:\n{}", rule);
        for t in &self.tables {
            let _ = writeln!(out, "Table {}: {} rows x {} columns", t.index, t.rows, t.columns);
            for (r, row) in t.cells.iter().enumerate() {
                for (c, text) in row.iter().enumerate() {
                    let _ = writeln!(out, "  Cell [{},{}]: {}", r + 1, c + 1, text);
                }
            }
        }

        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Unset means inherited from the paragraph or document style
fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "inherited",
    }
}
