// 🧹 Letter Tidy - final clean-up pass over generated letters
//
// Per letter: the "Pridedama:" heading goes above its attachment list,
// everything after the last list item is dropped, and the signature block
// (a table with a scanned signature, usually) is appended.

use crate::docx::content::{empty_paragraph, is_bullet, paragraph_text};
use crate::docx::document::{image_content_type, IMAGE_RELATIONSHIP};
use crate::docx::{Document, XmlElement};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SIGNATURE_FILE_NAME: &str = "Signature.docx";

const ATTACHMENTS_KEYWORD: &str = "pridedama";
const SPACING_PARAGRAPHS: usize = 3;

// ============================================================================
// SIGNATURE
// ============================================================================

/// Signature document from the configured path: a directory holding
/// Signature.docx, or the document itself
pub fn resolve_signature_path(setting: Option<&Path>) -> Option<PathBuf> {
    let Some(path) = setting.filter(|p| !p.as_os_str().is_empty()) else {
        info!("No signature configured, letters are tidied without one");
        return None;
    };

    if path.is_dir() {
        let candidate = path.join(SIGNATURE_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        warn!(dir = %path.display(), "Signature.docx not found in signature directory");
        return None;
    }

    if path.is_file() {
        return Some(path.to_path_buf());
    }

    warn!(path = %path.display(), "Signature file not found");
    None
}

/// Blocks to append: the first table, or every paragraph if there is none
pub fn signature_blocks(signature: &Document) -> Vec<XmlElement> {
    match signature.tables().first() {
        Some(table) => vec![(*table).clone()],
        None => signature.paragraphs().into_iter().cloned().collect(),
    }
}

/// Append the signature blocks, copying referenced images into the target
/// package under fresh relationship ids. Returns the number of images copied.
pub fn append_signature(target: &mut Document, signature: &Document) -> Result<usize> {
    let mut blocks = signature_blocks(signature);

    let mut referenced = Vec::new();
    for block in &blocks {
        collect_relationship_refs(block, &mut referenced);
    }

    let mut id_map: HashMap<String, Option<String>> = HashMap::new();
    let mut copied = 0;
    for old_id in referenced {
        if id_map.contains_key(&old_id) {
            continue;
        }
        let new_id = copy_image_relationship(target, signature, &old_id)?;
        if new_id.is_some() {
            copied += 1;
        }
        id_map.insert(old_id, new_id);
    }

    for block in &mut blocks {
        rewrite_relationship_refs(block, &id_map);
        target.append(block.clone());
    }

    Ok(copied)
}

fn is_relationship_attr(key: &str) -> bool {
    matches!(key, "r:embed" | "r:id" | "r:link")
}

fn collect_relationship_refs(element: &XmlElement, out: &mut Vec<String>) {
    for (key, value) in &element.attrs {
        if is_relationship_attr(key) {
            out.push(value.clone());
        }
    }
    for child in element.elements() {
        collect_relationship_refs(child, out);
    }
}

/// Unmapped references are dropped: they would dangle in the target
fn rewrite_relationship_refs(element: &mut XmlElement, id_map: &HashMap<String, Option<String>>) {
    let mut rewrite = |e: &mut XmlElement| {
        e.attrs.retain_mut(|(key, value)| {
            if !is_relationship_attr(key) {
                return true;
            }
            match id_map.get(value.as_str()) {
                Some(Some(new_id)) => {
                    *value = new_id.clone();
                    true
                }
                _ => false,
            }
        });
    };

    rewrite(element);
    element.visit_mut(&mut rewrite);
}

/// Copy the media part behind an image relationship; `None` for anything
/// that is not an image
fn copy_image_relationship(
    target: &mut Document,
    source: &Document,
    old_id: &str,
) -> Result<Option<String>> {
    let Some((rel_type, rel_target)) = source.relationship(old_id) else {
        debug!(id = old_id, "Signature references unknown relationship");
        return Ok(None);
    };
    if rel_type != IMAGE_RELATIONSHIP {
        debug!(id = old_id, rel_type, "Dropping non-image reference from signature");
        return Ok(None);
    }

    let source_part = resolve_part_name(rel_target);
    let Some(data) = source.package().part(&source_part) else {
        warn!(part = %source_part, "Signature image part missing");
        return Ok(None);
    };
    let data = data.to_vec();

    let extension = Path::new(&source_part)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();
    let content_type = source
        .default_content_type(&extension)
        .unwrap_or_else(|| image_content_type(&extension))
        .to_string();

    let media_name = unused_media_name(target, &extension);
    target
        .package_mut()
        .set_part(&format!("word/{}", media_name), data);
    target.ensure_default_content_type(&extension, &content_type);

    let new_id = target.add_relationship(IMAGE_RELATIONSHIP, &media_name);
    debug!(from = old_id, to = %new_id, media = %media_name, "Copied signature image");

    Ok(Some(new_id))
}

/// Relationship target (relative to word/) as a package part name
fn resolve_part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target.trim_start_matches("./")),
    }
}

/// "media/signatureN.ext" not yet present in the target package
fn unused_media_name(target: &Document, extension: &str) -> String {
    (1..)
        .map(|n| format!("media/signature{}.{}", n, extension))
        .find(|name| !target.package().has_part(&format!("word/{}", name)))
        .unwrap_or_else(|| format!("media/signature.{}", extension))
}

// ============================================================================
// TIDY STEPS
// ============================================================================

/// Move each attachments heading above the list items directly before it.
/// Returns the number of headings moved.
pub fn move_attachment_headings(doc: &mut Document) -> usize {
    let headings: Vec<usize> = doc
        .paragraphs()
        .iter()
        .enumerate()
        .filter(|(_, p)| paragraph_text(p).to_lowercase().contains(ATTACHMENTS_KEYWORD))
        .map(|(i, _)| i)
        .collect();

    let mut moved = 0;
    for heading in headings.into_iter().rev() {
        let indices = doc.paragraph_indices();
        if heading == 0 || heading >= indices.len() {
            continue;
        }

        let mut first_bullet = heading;
        while first_bullet > 0
            && doc
                .element_at(indices[first_bullet - 1])
                .map(is_bullet)
                .unwrap_or(false)
        {
            first_bullet -= 1;
        }

        if first_bullet == heading {
            continue;
        }

        if let Some(paragraph) = doc.remove_at(indices[heading]) {
            doc.insert_at(indices[first_bullet], paragraph);
            moved += 1;
        }
    }

    moved
}

/// Drop every body paragraph after the last list item. Returns the number removed.
pub fn remove_after_last_bullet(doc: &mut Document) -> usize {
    let indices = doc.paragraph_indices();
    let Some(last_bullet) = indices
        .iter()
        .rposition(|&i| doc.element_at(i).map(is_bullet).unwrap_or(false))
    else {
        return 0;
    };

    let trailing: Vec<usize> = indices[last_bullet + 1..].to_vec();
    for &index in trailing.iter().rev() {
        doc.remove_at(index);
    }

    trailing.len()
}

pub fn add_spacing(doc: &mut Document, count: usize) {
    for _ in 0..count {
        doc.append(empty_paragraph());
    }
}

// ============================================================================
// RUN
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct TidyReport {
    pub headings_moved: usize,
    pub paragraphs_removed: usize,
    pub signature_added: bool,
    pub images_copied: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct TidySummary {
    pub tidied: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Tidy one letter in place
pub fn tidy_document(path: &Path, signature: Option<&Document>) -> Result<TidyReport> {
    let mut doc = Document::open(path)?;
    let mut report = TidyReport {
        headings_moved: move_attachment_headings(&mut doc),
        paragraphs_removed: remove_after_last_bullet(&mut doc),
        ..Default::default()
    };

    add_spacing(&mut doc, SPACING_PARAGRAPHS);

    if let Some(signature) = signature {
        report.images_copied = append_signature(&mut doc, signature)?;
        report.signature_added = true;
    }

    doc.save(path)?;
    Ok(report)
}

/// `*.docx` of a directory, by file name; Word lock files skipped
pub fn find_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list directory: {}", dir.display()))? {
        let path = entry?.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let is_docx = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("docx"))
            .unwrap_or(false);

        if is_docx && !name.starts_with("~$") && path.is_file() {
            documents.push(path);
        }
    }

    documents.sort();
    Ok(documents)
}

/// Tidy every letter of `dir`; per-file failures are logged and collected
pub fn tidy_directory(dir: &Path, signature_setting: Option<&Path>) -> Result<TidySummary> {
    if !dir.is_dir() {
        bail!("Path not found or not a directory: {}", dir.display());
    }

    let signature = match resolve_signature_path(signature_setting) {
        Some(path) => Some(Document::open(&path).context("Failed to open signature document")?),
        None => None,
    };

    let documents = find_documents(dir)?;
    if documents.is_empty() {
        warn!(dir = %dir.display(), "No .docx files found");
    }

    let mut summary = TidySummary::default();
    for path in documents {
        match tidy_document(&path, signature.as_ref()) {
            Ok(report) => {
                info!(
                    file = %path.display(),
                    moved = report.headings_moved,
                    removed = report.paragraphs_removed,
                    signature = report.signature_added,
                    "Tidied letter"
                );
                summary.tidied.push(path);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to tidy letter");
                summary.failed.push((path, e.to_string()));
            }
        }
    }

    Ok(summary)
}
