// ✍️ Content Helpers - paragraphs, runs and table cells
//
// Free functions over XmlElement so they work the same on body paragraphs
// and on paragraphs nested in table cells.

use super::style::{ParagraphStyle, RunStyle};
use super::xml::{XmlElement, XmlNode};

// ============================================================================
// RUNS
// ============================================================================

/// Direct w:r children of a paragraph
pub fn runs(paragraph: &XmlElement) -> Vec<&XmlElement> {
    paragraph.children_named("w:r").collect()
}

/// Text of a run (its w:t children; tabs and breaks as whitespace)
pub fn run_text(run: &XmlElement) -> String {
    let mut text = String::new();
    for child in run.elements() {
        match child.name.as_str() {
            "w:t" => text.push_str(&child.inner_text()),
            "w:tab" => text.push('\t'),
            "w:br" | "w:cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

/// Replace a run's content with one text element; formatting kept
pub fn set_run_text(run: &mut XmlElement, text: &str) {
    run.children
        .retain(|node| matches!(node, XmlNode::Element(e) if e.is("w:rPr")));
    run.children.push(XmlNode::Element(text_element(text)));
}

fn text_element(text: &str) -> XmlElement {
    XmlElement::new("w:t")
        .with_attr("xml:space", "preserve")
        .with_text(text)
}

pub fn new_run(text: &str, style: &RunStyle) -> XmlElement {
    let mut run = XmlElement::new("w:r").with_child(text_element(text));
    style.apply_to(&mut run);
    run
}

// ============================================================================
// PARAGRAPHS
// ============================================================================

/// Visible text of a paragraph, runs inside hyperlinks and fields included
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    paragraph
        .descendants_named("w:r")
        .into_iter()
        .map(run_text)
        .collect()
}

pub fn new_paragraph(style: &ParagraphStyle, runs: Vec<XmlElement>) -> XmlElement {
    let mut paragraph = XmlElement::new("w:p");
    style.apply_to(&mut paragraph);
    for run in runs {
        paragraph.children.push(XmlNode::Element(run));
    }
    paragraph
}

pub fn empty_paragraph() -> XmlElement {
    XmlElement::new("w:p")
}

/// Replace `key` inside every direct run that contains it whole.
/// Returns true if anything changed.
pub fn replace_in_runs(paragraph: &mut XmlElement, key: &str, value: &str) -> bool {
    let mut replaced = false;

    for run in paragraph.elements_mut().filter(|e| e.is("w:r")) {
        let text = run_text(run);
        if text.contains(key) {
            set_run_text(run, &text.replace(key, value));
            replaced = true;
        }
    }

    replaced
}

/// Drop all runs (and other inline content), keep paragraph properties
pub fn clear_runs(paragraph: &mut XmlElement) {
    paragraph
        .children
        .retain(|node| matches!(node, XmlNode::Element(e) if e.is("w:pPr")));
}

/// Single-run paragraph text, keeping paragraph properties and the first
/// run's formatting
pub fn set_paragraph_text(paragraph: &mut XmlElement, text: &str) {
    let style = paragraph
        .child("w:r")
        .map(RunStyle::from_run)
        .unwrap_or_default();

    clear_runs(paragraph);
    paragraph.children.push(XmlNode::Element(new_run(text, &style)));
}

/// List item: non-empty text and a bullet glyph, a list style or numbering
pub fn is_bullet(paragraph: &XmlElement) -> bool {
    let text = paragraph_text(paragraph);
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    if text.starts_with('•') || text.starts_with('-') {
        return true;
    }

    let style = ParagraphStyle::from_paragraph(paragraph);
    let listy_style = style
        .style_id
        .as_deref()
        .map(|id| {
            let id = id.to_lowercase();
            id.contains("bullet") || id.contains("list")
        })
        .unwrap_or(false);

    listy_style || paragraph.child("w:pPr").and_then(|p| p.child("w:numPr")).is_some()
}

// ============================================================================
// TABLES
// ============================================================================

pub fn table_rows(table: &XmlElement) -> Vec<&XmlElement> {
    table.children_named("w:tr").collect()
}

pub fn row_cells(row: &XmlElement) -> Vec<&XmlElement> {
    row.children_named("w:tc").collect()
}

/// Cell paragraphs joined by newlines
pub fn cell_text(cell: &XmlElement) -> String {
    cell.children_named("w:p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cell holds exactly one paragraph with `text`; the first paragraph's
/// properties and first run's formatting are kept
pub fn set_cell_text(cell: &mut XmlElement, text: &str) {
    let mut seen_first = false;
    cell.children.retain(|node| match node {
        XmlNode::Element(e) if e.is("w:p") => {
            let keep = !seen_first;
            seen_first = true;
            keep
        }
        _ => true,
    });

    set_paragraph_text(cell.child_or_insert("w:p"), text);
}
