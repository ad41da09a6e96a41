// 🏗️ Project Info Files - per-directory plant/project values
//
// A source directory `VE12/` carries `VE12/VE12.txt`:
//
//   BENDRAS_NR=VE12
//   PROJEKTO_NR=2024-15
//   PAVADINIMAS=Vėjo elektrinės VE12 statybos projektas

use crate::entities::ProjectInfo;
use crate::table::{parse_table, UTF8_BOM};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const PLANT_KEY: &str = "BENDRAS_NR";
const PROJECT_NUMBER_KEY: &str = "PROJEKTO_NR";
const PROJECT_NAME_KEY: &str = "PAVADINIMAS";

/// `<dir>/<dir-name>.txt`
pub fn info_file_path(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dir.join(format!("{}.txt", name))
}

/// Parse `KEY=value` lines; unknown keys are ignored, later lines win
pub fn parse_info(content: &str) -> ProjectInfo {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut project = ProjectInfo::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();

        match key {
            PLANT_KEY => project.plant_number = value,
            PROJECT_NUMBER_KEY => project.project_number = value,
            PROJECT_NAME_KEY => project.project_name = value,
            _ => {}
        }
    }

    project
}

/// Project values for a source directory; a missing or unreadable file
/// yields empty values
pub fn read_project_info(dir: &Path) -> ProjectInfo {
    let path = info_file_path(dir);

    if !path.exists() {
        warn!(path = %path.display(), "Info file not found, project columns left empty");
        return ProjectInfo::default();
    }

    match fs::read_to_string(&path) {
        Ok(content) => {
            info!(path = %path.display(), "Found info file");
            parse_info(&content)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read info file");
            ProjectInfo::default()
        }
    }
}

/// Render the three lines of an info file
pub fn render_info(project: &ProjectInfo) -> String {
    format!(
        "{}={}\n{}={}\n{}={}\n",
        PLANT_KEY,
        project.plant_number,
        PROJECT_NUMBER_KEY,
        project.project_number,
        PROJECT_NAME_KEY,
        project.project_name
    )
}

/// Generate `<output>/<plant>.txt` for every row of a semicolon listing with
/// at least three fields. Returns the files written.
pub fn write_info_files(listing: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let content = fs::read_to_string(listing)
        .with_context(|| format!("Failed to read listing: {}", listing.display()))?;
    let records = parse_table(&content, b';')
        .with_context(|| format!("Failed to parse listing: {}", listing.display()))?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let mut written = Vec::new();
    for record in records {
        if record.len() < 3 {
            continue;
        }

        let project = ProjectInfo::new(record[0].clone(), record[1].clone(), record[2].clone());
        let path = output_dir.join(format!("{}.txt", project.plant_number));

        fs::write(&path, render_info(&project))
            .with_context(|| format!("Failed to write info file: {}", path.display()))?;
        info!(path = %path.display(), "Info file written");
        written.push(path);
    }

    Ok(written)
}
