// ⚙️ Settings - parcel-notice.toml overlaid by environment variables
//
// Every command reads the same Settings; each one only demands the keys it
// needs, through the `require_*` accessors, before it touches any input.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE_STEM: &str = "parcel-notice";

/// Numbered source directory variables: DIR_ELEKTRINE_1, DIR_ELEKTRINE_2, ...
pub const SOURCE_DIR_VAR_PREFIX: &str = "DIR_ELEKTRINE_";

pub const DEFAULT_LOOKUP_URL: &str =
    "https://mgvdisisorinis.registrucentras.lt/ivn/paieska-pagal-asmeni";
pub const DEFAULT_LOOKUP_PURPOSE: &str = "10026";
pub const DEFAULT_LOOKUP_DELAY_MS: u64 = 3000;
pub const DEFAULT_INPUT_DIRECTORY: &str = "out";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{key}` (set `{key}` in parcel-notice.toml or {} in the environment)", .key.to_uppercase())]
    Missing { key: &'static str },

    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to read .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directories holding registry extract PDFs
    #[serde(default)]
    pub source_dirs: Vec<PathBuf>,

    /// Stage directory: aggregated table, letter template, letters
    pub dir_etapas: Option<PathBuf>,

    /// Directory of the table to enrich
    pub input_directory: Option<PathBuf>,

    /// Session cookie for the residence lookup service
    pub rc_cookie: Option<String>,

    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,

    #[serde(default = "default_lookup_purpose")]
    pub lookup_purpose: String,

    #[serde(default = "default_lookup_delay_ms")]
    pub lookup_delay_ms: u64,

    /// Letter template file name inside the stage directory
    pub template_file_name: Option<String>,

    #[serde(default = "default_etapas_output_file_name")]
    pub etapas_output_file_name: String,

    pub sender_email: Option<String>,

    /// Directory of generated letters to tidy
    pub dir_sutvarkymas: Option<PathBuf>,

    /// Signature document, or a directory holding Signature.docx
    pub dir_parasas: Option<PathBuf>,

    pub log_level: Option<String>,
}

fn default_lookup_url() -> String {
    DEFAULT_LOOKUP_URL.to_string()
}

fn default_lookup_purpose() -> String {
    DEFAULT_LOOKUP_PURPOSE.to_string()
}

fn default_lookup_delay_ms() -> u64 {
    DEFAULT_LOOKUP_DELAY_MS
}

fn default_etapas_output_file_name() -> String {
    crate::table::AGGREGATED_FILE_NAME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source_dirs: Vec::new(),
            dir_etapas: None,
            input_directory: None,
            rc_cookie: None,
            lookup_url: default_lookup_url(),
            lookup_purpose: default_lookup_purpose(),
            lookup_delay_ms: default_lookup_delay_ms(),
            template_file_name: None,
            etapas_output_file_name: default_etapas_output_file_name(),
            sender_email: None,
            dir_sutvarkymas: None,
            dir_parasas: None,
            log_level: None,
        }
    }
}

impl Settings {
    /// `parcel-notice.toml` in the working directory (optional), then the
    /// environment (a `.env` file found from the working directory upwards
    /// fills unset variables), then the numbered source directory variables
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let config = Config::builder()
            .add_source(File::with_name(CONFIG_FILE_STEM).required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings
            .source_dirs
            .extend(numbered_source_dirs(|name| std::env::var(name).ok()));

        Ok(settings)
    }

    /// Settings from the variables of one `.env` file only
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let vars = dotenvy::from_path_iter(path)?.collect::<Result<HashMap<String, String>, _>>()?;

        let config = Config::builder()
            .add_source(Environment::default().source(Some(vars.clone())).try_parsing(true))
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings
            .source_dirs
            .extend(numbered_source_dirs(|name| vars.get(name).cloned()));

        Ok(settings)
    }

    /// Settings from TOML text only
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn lookup_delay(&self) -> Duration {
        Duration::from_millis(self.lookup_delay_ms)
    }

    /// `<input_directory or "out">/output.csv`
    pub fn enrichment_input(&self) -> PathBuf {
        self.input_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIRECTORY))
            .join(crate::table::OUTPUT_FILE_NAME)
    }

    pub fn sender_email(&self) -> Option<&str> {
        non_empty(self.sender_email.as_deref())
    }

    pub fn require_rc_cookie(&self) -> Result<&str, ConfigError> {
        non_empty(self.rc_cookie.as_deref()).ok_or(ConfigError::Missing { key: "rc_cookie" })
    }

    pub fn require_dir_etapas(&self) -> Result<&Path, ConfigError> {
        non_empty_path(self.dir_etapas.as_deref()).ok_or(ConfigError::Missing { key: "dir_etapas" })
    }

    pub fn require_template_file_name(&self) -> Result<&str, ConfigError> {
        non_empty(self.template_file_name.as_deref())
            .ok_or(ConfigError::Missing { key: "template_file_name" })
    }

    pub fn require_dir_sutvarkymas(&self) -> Result<&Path, ConfigError> {
        non_empty_path(self.dir_sutvarkymas.as_deref())
            .ok_or(ConfigError::Missing { key: "dir_sutvarkymas" })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn non_empty_path(value: Option<&Path>) -> Option<&Path> {
    value.filter(|p| !p.as_os_str().is_empty())
}

/// DIR_ELEKTRINE_1, DIR_ELEKTRINE_2, ... until the first unset or empty one
pub fn numbered_source_dirs<F>(lookup: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut dirs = Vec::new();

    for i in 1.. {
        match lookup(&format!("{}{}", SOURCE_DIR_VAR_PREFIX, i)) {
            Some(value) if !value.trim().is_empty() => dirs.push(PathBuf::from(value.trim())),
            _ => break,
        }
    }

    dirs
}
