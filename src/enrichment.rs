// 🏠 Address Enrichment - declared residence lookup per table row
//
// The lookup service answers an HTML page per person. Each distinct
// (first name, surname, birth date) is asked once per run; answers, empty
// ones included, are remembered in a LookupCache owned by that run.

use crate::table::{col, is_header, pad_record, read_table, write_records};
use anyhow::{Context, Result};
use kuchiki::traits::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const DECLARED_LABEL: &str = "Deklaravo gyvenamąją vietą:";

static DECLARED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Deklaravo gyvenamąją vietą:\s*\d{4}-\d{2}-\d{2}\s*(.+)").expect("declared pattern")
});

static POSTAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*),\s*(LT-\d{5})$").expect("postal pattern"));

/// Rows shorter than this carry no person and are passed through
const MIN_LOOKUP_COLUMNS: usize = 8;

// ============================================================================
// DECLARED ADDRESS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeclaredAddress {
    pub address: String,

    /// "LT-#####" or empty
    pub postal_code: String,
}

impl DeclaredAddress {
    pub fn is_found(&self) -> bool {
        !self.address.is_empty()
    }
}

/// Split "Vilniaus g. 1, LT-01100" into address and postal code
pub fn split_postal_code(full: &str) -> DeclaredAddress {
    let full = full.trim();

    match POSTAL_RE.captures(full) {
        Some(caps) => DeclaredAddress {
            address: caps[1].trim().to_string(),
            postal_code: caps[2].trim().to_string(),
        },
        None => DeclaredAddress {
            address: full.to_string(),
            postal_code: String::new(),
        },
    }
}

/// Declared address from the lookup response page: the first text node that
/// mentions the declaration label, or empty
pub fn extract_declared_address(html: &str) -> DeclaredAddress {
    let document = kuchiki::parse_html().one(html);

    let node = document
        .descendants()
        .text_nodes()
        .map(|text| text.borrow().clone())
        .find(|text| text.contains(DECLARED_LABEL));

    let Some(node) = node else {
        return DeclaredAddress::default();
    };

    match DECLARED_RE.captures(node.trim()) {
        Some(caps) => split_postal_code(&caps[1]),
        None => DeclaredAddress::default(),
    }
}

// ============================================================================
// LOOKUP
// ============================================================================

/// One person to look up; `note` is the registry number the search is filed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonQuery {
    pub note: String,
    pub first_name: String,
    pub surname: String,
    pub birth_date: String,
}

impl PersonQuery {
    pub fn from_record(record: &[String]) -> Self {
        let cell = |i: usize| record.get(i).cloned().unwrap_or_default();
        PersonQuery {
            note: cell(col::REGISTRY_NUMBER),
            first_name: cell(col::FIRST_NAME),
            surname: cell(col::SURNAME),
            birth_date: cell(col::ID_OR_DATE),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        (
            self.first_name.clone(),
            self.surname.clone(),
            self.birth_date.clone(),
        )
    }
}

/// AddressLookup - resolves a person's declared residence
pub trait AddressLookup {
    /// `Ok(DeclaredAddress::default())` when the service knows no address
    fn lookup(&self, query: &PersonQuery) -> Result<DeclaredAddress>;

    fn name(&self) -> &str;
}

/// Form-encoded POST against the residence search page
pub struct HttpAddressLookup {
    client: reqwest::blocking::Client,
    url: String,
    purpose: String,
    cookie: String,
}

impl HttpAddressLookup {
    pub fn new(
        url: impl Into<String>,
        purpose: impl Into<String>,
        cookie: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpAddressLookup {
            client,
            url: url.into(),
            purpose: purpose.into(),
            cookie: cookie.into(),
        })
    }

    /// Search form fields
    pub fn form(&self, query: &PersonQuery) -> Vec<(&'static str, String)> {
        vec![
            ("XML[uzk_parametrai][paieskos_tikslas][VALUE]", self.purpose.clone()),
            ("page_type", "perziura".to_string()),
            ("XML[uzk_parametrai][paieskos_pastaba][VALUE]", query.note.clone()),
            ("XML[uzk_parametrai][asm_kodas][VALUE]", String::new()),
            ("XML[uzk_parametrai][vardas][VALUE]", query.first_name.to_uppercase()),
            ("XML[uzk_parametrai][pavarde][VALUE]", query.surname.to_uppercase()),
            ("XML[uzk_parametrai][tiksli_gim_data][VALUE]", query.birth_date.clone()),
            ("XML[uzk_parametrai][gim_metai_nuo][VALUE]", String::new()),
            ("XML[uzk_parametrai][gim_metai_iki][VALUE]", String::new()),
        ]
    }
}

impl AddressLookup for HttpAddressLookup {
    fn lookup(&self, query: &PersonQuery) -> Result<DeclaredAddress> {
        let response = self
            .client
            .post(&self.url)
            .header("Cookie", &self.cookie)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .form(&self.form(query))
            .send()
            .context("Address lookup request failed")?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, note = %query.note, "Address lookup returned non-success status");
            return Ok(DeclaredAddress::default());
        }

        let html = response.text().context("Failed to read lookup response")?;
        Ok(extract_declared_address(&html))
    }

    fn name(&self) -> &str {
        "registrucentras"
    }
}

// ============================================================================
// CACHE
// ============================================================================

/// (first name, surname, birth date)
pub type CacheKey = (String, String, String);

/// Per-run memo of lookup answers; never persisted
#[derive(Debug, Default)]
pub struct LookupCache {
    entries: HashMap<CacheKey, DeclaredAddress>,
}

impl LookupCache {
    pub fn new() -> Self {
        LookupCache::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&DeclaredAddress> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, address: DeclaredAddress) {
        self.entries.insert(key, address);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// ENRICHER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    /// Data rows seen (header excluded)
    pub rows: usize,
    pub lookups: usize,
    pub cache_hits: usize,
    pub found: usize,
}

pub struct Enricher<L: AddressLookup> {
    lookup: L,
    delay: Duration,
}

impl<L: AddressLookup> Enricher<L> {
    pub fn new(lookup: L) -> Self {
        Enricher {
            lookup,
            delay: Duration::ZERO,
        }
    }

    /// Pause after every request to the service
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fill declared address / postal code columns of every data row
    pub fn enrich_records(
        &self,
        records: &mut [Vec<String>],
        cache: &mut LookupCache,
    ) -> EnrichmentSummary {
        let mut summary = EnrichmentSummary::default();

        for record in records.iter_mut() {
            if is_header(record) {
                continue;
            }
            summary.rows += 1;

            if record.len() < MIN_LOOKUP_COLUMNS {
                pad_record(record);
                continue;
            }

            let query = PersonQuery::from_record(record);
            let key = query.cache_key();

            let address = match cache.get(&key) {
                Some(address) => {
                    summary.cache_hits += 1;
                    address.clone()
                }
                None => {
                    let address = self.fetch(&query);
                    summary.lookups += 1;
                    cache.insert(key, address.clone());
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    address
                }
            };

            if address.is_found() {
                summary.found += 1;
            }

            pad_record(record);
            record[col::DECLARED_ADDRESS] = address.address;
            record[col::POSTAL_CODE] = address.postal_code;
        }

        summary
    }

    /// Enrich a table file in place
    pub fn enrich_file(&self, path: &Path) -> Result<EnrichmentSummary> {
        let mut records = read_table(path)?;
        let mut cache = LookupCache::new();

        info!(path = %path.display(), rows = records.len(), lookup = self.lookup.name(), "Enriching table");
        let summary = self.enrich_records(&mut records, &mut cache);

        write_records(path, &records)?;
        info!(
            path = %path.display(),
            lookups = summary.lookups,
            cache_hits = summary.cache_hits,
            found = summary.found,
            "Table enriched"
        );

        Ok(summary)
    }

    fn fetch(&self, query: &PersonQuery) -> DeclaredAddress {
        match self.lookup.lookup(query) {
            Ok(address) => {
                debug!(
                    first_name = %query.first_name,
                    surname = %query.surname,
                    found = address.is_found(),
                    "Lookup finished"
                );
                address
            }
            Err(e) => {
                warn!(note = %query.note, error = %e, "Address lookup failed");
                DeclaredAddress::default()
            }
        }
    }
}
