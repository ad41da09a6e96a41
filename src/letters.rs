// ✉️ Letter Generator - aggregated table → one notification letter per recipient
//
// Every letter starts from a fresh copy of the template. Placeholders are
// replaced inside runs so the template's formatting survives; repeated
// structures (plot table rows, project paragraphs, attachment list) are
// grown from an exemplar element found in the template.

use crate::docx::content::{clear_runs, new_paragraph, new_run, paragraph_text, replace_in_runs, set_cell_text};
use crate::docx::{Document, ParagraphStyle, RunStyle, XmlElement, XmlNode};
use crate::table::{col, parse_table, UTF8_BOM};
use anyhow::{bail, Context, Result};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const RECIPIENT_PLACEHOLDER: &str = "gavejas_1";
pub const ADDRESS_PLACEHOLDER: &str = "adresas_2";
pub const POSTAL_CODE_PLACEHOLDER: &str = "pasto_kodas_3";
pub const DATE_PLACEHOLDER: &str = "proj_data";
pub const PROJECT_NAME_PLACEHOLDER: &str = "proj_pav_5";
pub const PLANT_LIST_PLACEHOLDER: &str = "elektrines_numeris_11";

const ATTACHMENTS_HEADING: &str = "Pridedama:";
const EMAIL_LABEL: &str = "El. p.:";

/// Wind plant project title prefix
pub const PROJECT_PREFIX: &str =
    "Energijos iš atsinaujinančių išteklių gamybos paskirties inžinerinio statinio, vėjo elektrinės";

/// Shorter form used to recognise project paragraphs
const PROJECT_MARKER: &str =
    "Energijos iš atsinaujinančių išteklių gamybos paskirties inžinerinio statinio";

const ATTESTATION_MARKERS: [&str; 2] = ["Skelbimas apie", "projektinių pasiūlymų viešinimą"];

/// Letters directory under the stage directory
pub const LETTERS_DIR_NAME: &str = "letters";

static VE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)VE(\d+)").expect("plant number pattern"));

static VE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bVE[0-9A-Za-z._-]*").expect("plant token pattern"));

static TRAILING_PROJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[,;:]?\s*statybos projektas\.?$").expect("project suffix pattern")
});

/// Rows need at least the type column
const MIN_LETTER_COLUMNS: usize = 9;

// ============================================================================
// RECIPIENTS
// ============================================================================

/// One land plot listed in a letter's table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Plot {
    pub registry_number: String,
    pub parcel_address: String,
    pub unique_number: String,
    pub cadastral_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectEntry {
    pub plant_number: String,
    pub project_number: String,
    pub project_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub name: String,
    pub address: String,
    pub postal_code: String,

    /// First-seen order, one entry per plant number
    pub projects: Vec<ProjectEntry>,

    /// Distinct, sorted
    pub plots: Vec<Plot>,
}

impl Recipient {
    /// Output file name: spaces → "_", "/" → "-", quotes dropped
    pub fn file_name(&self) -> String {
        let safe = self.name.replace(' ', "_").replace('/', "-").replace('"', "");
        format!("{}.docx", safe)
    }
}

/// (first name, surname or "", id/date)
type RecipientKey = (String, String, String);

#[derive(Debug, Default)]
pub struct RecipientGroups {
    pub recipients: Vec<Recipient>,

    /// Display names of groups without any declared address
    pub skipped: Vec<String>,

    /// Distinct individuals and organizations seen
    pub groups: usize,
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Group data rows by person/organization and build one Recipient per group
pub fn build_recipients(rows: &[Vec<String>]) -> RecipientGroups {
    let mut order: Vec<RecipientKey> = Vec::new();
    let mut groups: HashMap<RecipientKey, Vec<&Vec<String>>> = HashMap::new();

    for row in rows {
        if row.len() < MIN_LETTER_COLUMNS {
            continue;
        }

        let key = match cell(row, col::ENTITY_TYPE).to_lowercase().as_str() {
            "fizinis" => (
                cell(row, col::FIRST_NAME).to_string(),
                cell(row, col::SURNAME).to_string(),
                cell(row, col::ID_OR_DATE).to_string(),
            ),
            "juridinis" => (
                cell(row, col::FIRST_NAME).to_string(),
                String::new(),
                cell(row, col::ID_OR_DATE).to_string(),
            ),
            _ => continue,
        };

        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    let mut result = RecipientGroups {
        groups: order.len(),
        ..Default::default()
    };

    for key in order {
        let Some(rows) = groups.get(&key) else {
            continue;
        };
        match recipient_from_rows(&key, rows) {
            Some(recipient) => result.recipients.push(recipient),
            None => result.skipped.push(format!("{} {}", key.0, key.1).trim().to_string()),
        }
    }

    result
}

fn recipient_from_rows(key: &RecipientKey, rows: &[&Vec<String>]) -> Option<Recipient> {
    let first = rows.first()?;
    let address_row = rows
        .iter()
        .find(|row| !cell(row, col::DECLARED_ADDRESS).is_empty())?;

    let name = if cell(first, col::ENTITY_TYPE).eq_ignore_ascii_case("fizinis") {
        format!("{} {}", key.0, key.1)
    } else {
        key.0.clone()
    };

    let mut projects: Vec<ProjectEntry> = Vec::new();
    let mut plots: BTreeSet<Plot> = BTreeSet::new();

    for row in rows {
        let plant_number = cell(row, col::PLANT_NUMBER).trim().replace(UTF8_BOM, "");
        if !projects.iter().any(|p| p.plant_number == plant_number) {
            projects.push(ProjectEntry {
                plant_number,
                project_number: cell(row, col::PROJECT_NUMBER).to_string(),
                project_name: cell(row, col::PROJECT_NAME).to_string(),
            });
        }

        plots.insert(Plot {
            registry_number: cell(row, col::REGISTRY_NUMBER).to_string(),
            parcel_address: cell(row, col::PARCEL_ADDRESS).to_string(),
            unique_number: cell(row, col::UNIQUE_NUMBER).to_string(),
            cadastral_number: cell(row, col::CADASTRAL_NUMBER).to_string(),
        });
    }

    Some(Recipient {
        name,
        address: cell(address_row, col::DECLARED_ADDRESS).to_string(),
        postal_code: cell(address_row, col::POSTAL_CODE).to_string(),
        projects,
        plots: plots.into_iter().collect(),
    })
}

// ============================================================================
// CSV INPUT
// ============================================================================

/// Delimiter of the header line: the most frequent of ',', ';' and tab
pub fn sniff_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, header_line.bytes().filter(|&b| b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

/// Data rows of a letters table (header dropped)
pub fn read_letter_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read table: {}", path.display()))?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

    let delimiter = sniff_delimiter(content.lines().next().unwrap_or(""));
    let mut records = parse_table(content, delimiter)
        .with_context(|| format!("Failed to parse table: {}", path.display()))?;

    if !records.is_empty() {
        records.remove(0);
    }
    Ok(records)
}

// ============================================================================
// TEXT BUILDERS
// ============================================================================

/// Number after "VE", for ordering plant lists
pub fn ve_sort_key(plant: &str) -> Option<u64> {
    VE_NUMBER_RE
        .captures(plant)
        .and_then(|caps| caps[1].parse().ok())
}

/// Plant numbers ordered by VE number; plants without one go last
pub fn sorted_plants(projects: &[ProjectEntry]) -> Vec<String> {
    let mut plants: Vec<&str> = projects.iter().map(|p| p.plant_number.as_str()).collect();
    plants.sort_by_key(|plant| match ve_sort_key(plant) {
        Some(n) => (0, n),
        None => (1, 0),
    });
    plants.into_iter().map(String::from).collect()
}

/// Body of a project paragraph (between the quotes)
pub fn project_description(plant: &str, name: &str) -> String {
    let name = name.trim();

    if name.is_empty() {
        return format!("{} {}, statybos projektas", PROJECT_PREFIX, plant);
    }

    if name.to_lowercase().contains(&PROJECT_PREFIX.to_lowercase()) {
        if !plant.is_empty() && !name.contains(plant) {
            let clean = name.trim_matches(|c| " ,;.".contains(c));
            return format!("{} {}, {}", PROJECT_PREFIX, plant, clean);
        }
        return name.to_string();
    }

    let stripped = TRAILING_PROJECT_RE.replace(name, "");
    let clean = stripped.trim_matches(|c| " ,;.".contains(c));
    format!("{} {}, {}, statybos projektas", PROJECT_PREFIX, plant, clean)
}

pub fn attestation_text(plant: &str) -> String {
    format!(
        "Skelbimas apie energijos iš atsinaujinančių išteklių gamybos paskirties inžinerinio statinio, vėjo elektrinės {}, projektinių pasiūlymų viešinimą (2 lapai);",
        plant
    )
}

fn is_attestation(text: &str) -> bool {
    ATTESTATION_MARKERS.iter().any(|m| text.contains(m))
}

// ============================================================================
// GENERATOR
// ============================================================================

pub struct LetterGenerator {
    template: Vec<u8>,

    /// Formatting of the template's first attachment paragraph
    attestation_style: Option<ParagraphStyle>,

    sender_email: Option<String>,
    date: String,
}

impl LetterGenerator {
    pub fn new(template_path: &Path) -> Result<Self> {
        let template = fs::read(template_path)
            .with_context(|| format!("Failed to read template: {}", template_path.display()))?;
        Self::from_bytes(template)
    }

    pub fn from_bytes(template: Vec<u8>) -> Result<Self> {
        let document = Document::from_bytes(&template).context("Invalid letter template")?;

        let attestation_style = document
            .paragraphs()
            .into_iter()
            .find(|p| paragraph_text(p).contains(ATTESTATION_MARKERS[0]))
            .map(ParagraphStyle::from_paragraph);

        Ok(LetterGenerator {
            template,
            attestation_style,
            sender_email: None,
            date: Local::now().format("%Y-%m-%d").to_string(),
        })
    }

    /// Builder pattern: rewrite the template's e-mail line
    pub fn with_sender_email(mut self, email: Option<&str>) -> Self {
        self.sender_email = email.map(String::from);
        self
    }

    /// Builder pattern: letter date (YYYY-MM-DD)
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn create_letter(&self, recipient: &Recipient) -> Result<Document> {
        let mut doc = Document::from_bytes(&self.template)?;

        self.apply_replacements(&mut doc, recipient);
        fill_plot_table(&mut doc, &recipient.plots);
        add_project_descriptions(&mut doc, &recipient.projects);
        self.add_attestations(&mut doc, &recipient.projects);
        if let Some(email) = &self.sender_email {
            set_email_line(&mut doc, email);
        }

        Ok(doc)
    }

    fn apply_replacements(&self, doc: &mut Document, recipient: &Recipient) {
        let replacements = [
            (RECIPIENT_PLACEHOLDER, recipient.name.as_str()),
            (ADDRESS_PLACEHOLDER, recipient.address.as_str()),
            (POSTAL_CODE_PLACEHOLDER, recipient.postal_code.as_str()),
            (DATE_PLACEHOLDER, self.date.as_str()),
        ];

        doc.for_each_paragraph_mut(|paragraph| {
            for (key, value) in &replacements {
                replace_in_runs(paragraph, key, value);
            }
        });
    }

    /// One attachment line per plant after "Pridedama:"
    fn add_attestations(&self, doc: &mut Document, projects: &[ProjectEntry]) {
        let Some(heading) = doc.find_paragraph(ATTACHMENTS_HEADING) else {
            return;
        };

        let paragraphs = doc.paragraph_indices();

        let mut plants: Vec<String> = paragraphs
            .iter()
            .take_while(|&&i| i < heading)
            .filter_map(|&i| doc.element_at(i).map(paragraph_text))
            .filter(|text| text.contains(PROJECT_MARKER))
            .filter_map(|text| VE_TOKEN_RE.find(&text).map(|m| m.as_str().to_string()))
            .collect();
        if plants.is_empty() {
            plants = projects.iter().map(|p| p.plant_number.clone()).collect();
        }

        // Template attachment lines right after the heading are replaced
        let stale: Vec<usize> = paragraphs
            .iter()
            .skip_while(|&&i| i <= heading)
            .take_while(|&&i| {
                doc.element_at(i)
                    .map(|p| is_attestation(&paragraph_text(p)))
                    .unwrap_or(false)
            })
            .copied()
            .collect();
        for index in stale.into_iter().rev() {
            doc.remove_at(index);
        }

        let style = match &self.attestation_style {
            Some(style) => style.clone(),
            None => doc
                .element_at(heading)
                .map(ParagraphStyle::from_paragraph)
                .unwrap_or_default(),
        };

        for (offset, plant) in plants.iter().enumerate() {
            let paragraph = new_paragraph(
                &style,
                vec![new_run(&attestation_text(plant), &RunStyle::arial_11())],
            );
            doc.insert_at(heading + 1 + offset, paragraph);
        }
    }

    /// Write every recipient's letter into `out_dir`
    pub fn generate_all(&self, recipients: &[Recipient], out_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create directory: {}", out_dir.display()))?;

        let mut written = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let doc = self.create_letter(recipient)?;
            let path = out_dir.join(recipient.file_name());
            doc.save(&path)?;

            info!(
                file = %path.display(),
                projects = recipient.projects.len(),
                plots = recipient.plots.len(),
                "Created letter"
            );
            written.push(path);
        }

        Ok(written)
    }
}

/// Second row of the first table is the exemplar; one row per plot
fn fill_plot_table(doc: &mut Document, plots: &[Plot]) {
    if plots.is_empty() {
        return;
    }

    let Some(table_index) = doc.table_indices().into_iter().find(|&i| {
        doc.element_at(i)
            .map(|t| t.children_named("w:tr").count() >= 2)
            .unwrap_or(false)
    }) else {
        return;
    };
    let Some(table) = doc.element_at_mut(table_index) else {
        return;
    };

    let row_positions: Vec<usize> = table
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| matches!(node, XmlNode::Element(e) if e.is("w:tr")))
        .map(|(i, _)| i)
        .collect();
    let exemplar_position = row_positions[1];

    let exemplar = match &table.children[exemplar_position] {
        XmlNode::Element(row) => row.clone(),
        XmlNode::Text(_) => return,
    };

    if let XmlNode::Element(row) = &mut table.children[exemplar_position] {
        fill_plot_row(row, &plots[0]);
    }

    for plot in &plots[1..] {
        let mut row = exemplar.clone();
        fill_plot_row(&mut row, plot);
        table.children.push(XmlNode::Element(row));
    }
}

fn fill_plot_row(row: &mut XmlElement, plot: &Plot) {
    let values = [
        plot.registry_number.as_str(),
        plot.unique_number.as_str(),
        plot.cadastral_number.as_str(),
        plot.parcel_address.as_str(),
    ];

    let cells = row.elements_mut().filter(|e| e.is("w:tc"));
    for (cell, value) in cells.zip(values) {
        set_cell_text(cell, value);
    }
}

/// First project fills the template paragraph; the rest follow it
fn add_project_descriptions(doc: &mut Document, projects: &[ProjectEntry]) {
    let Some(first) = projects.first() else {
        return;
    };
    let (Some(project_index), Some(plant_list_index)) = (
        doc.find_paragraph(PROJECT_NAME_PLACEHOLDER),
        doc.find_paragraph(PLANT_LIST_PLACEHOLDER),
    ) else {
        warn!("Template lacks project placeholders, project paragraphs not filled");
        return;
    };

    if let Some(paragraph) = doc.element_at_mut(project_index) {
        replace_in_runs(paragraph, PROJECT_NAME_PLACEHOLDER, &first.project_name);
    }

    let plant_list = sorted_plants(projects).join(", ");
    if let Some(paragraph) = doc.element_at_mut(plant_list_index) {
        replace_in_runs(paragraph, PLANT_LIST_PLACEHOLDER, &plant_list);
    }

    let style = doc
        .element_at(project_index)
        .map(ParagraphStyle::from_paragraph)
        .unwrap_or_default();
    let font = RunStyle::arial_11();

    for (offset, project) in projects[1..].iter().enumerate() {
        let paragraph = new_paragraph(
            &style,
            vec![
                new_run("„", &font),
                new_run(&project_description(&project.plant_number, &project.project_name), &font),
                new_run("\";", &font),
            ],
        );
        doc.insert_at(project_index + 1 + offset, paragraph);
    }
}

fn set_email_line(doc: &mut Document, email: &str) {
    let Some(index) = doc.find_paragraph(EMAIL_LABEL) else {
        return;
    };
    let Some(paragraph) = doc.element_at_mut(index) else {
        return;
    };

    let font = RunStyle::arial_11();
    clear_runs(paragraph);
    paragraph.children.push(XmlNode::Element(new_run(EMAIL_LABEL, &font)));
    paragraph
        .children
        .push(XmlNode::Element(new_run(&format!(" {}", email), &font)));
}

// ============================================================================
// RUN
// ============================================================================

#[derive(Debug, Default, Serialize)]
pub struct LetterSummary {
    pub groups: usize,
    pub letters: Vec<PathBuf>,
    pub skipped: Vec<String>,
    pub out_dir: PathBuf,
}

/// Letters for every addressable recipient of `<stage>/<table>` into `<stage>/letters`
pub fn generate_letters(
    stage_dir: &Path,
    template_file_name: &str,
    table_file_name: &str,
    sender_email: Option<&str>,
) -> Result<LetterSummary> {
    let template_path = stage_dir.join(template_file_name);
    let table_path = stage_dir.join(table_file_name);

    if !template_path.is_file() || !table_path.is_file() {
        bail!(
            "Required files not found: template {} ({}), table {} ({})",
            template_path.display(),
            if template_path.is_file() { "exists" } else { "missing" },
            table_path.display(),
            if table_path.is_file() { "exists" } else { "missing" },
        );
    }

    info!(template = %template_path.display(), table = %table_path.display(), "Generating letters");

    let rows = read_letter_rows(&table_path)?;
    let groups = build_recipients(&rows);
    for name in &groups.skipped {
        warn!(recipient = %name, "Skipping recipient without declared address");
    }

    let generator = LetterGenerator::new(&template_path)?.with_sender_email(sender_email);
    let out_dir = stage_dir.join(LETTERS_DIR_NAME);
    let letters = generator.generate_all(&groups.recipients, &out_dir)?;

    Ok(LetterSummary {
        groups: groups.groups,
        letters,
        skipped: groups.skipped,
        out_dir,
    })
}
