// 🧾 Entry Parsing - one raw holder segment → typed fields
//
// A raw entry looks like "Jonas Jonaitis, gim. 1980-01-01" or
// "UAB Forestas, a.k. 123456789". The marker decides the entity type and
// splits the name from the birth date / company code.

use crate::entities::EntityType;
use once_cell::sync::Lazy;
use regex::Regex;

/// The State as registry holder; never written to the output
pub const SENTINEL_ENTRY: &str = "Lietuvos Respublika, a.k. 111105555";

const BIRTHDATE_MARKER: &str = ", gim.";
const COMPANY_CODE_MARKER: &str = ", a.k.";

static ENTRY_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),\s*(?:gim\.|a\.k\.)\s*").expect("entry split pattern"));

// ============================================================================
// PARSED ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub first_name: String,
    pub surname: String,
    pub id_or_date: String,
    pub entity_type: EntityType,
}

/// Parse one raw entry; `None` for the sentinel entity
pub fn parse_entry(raw: &str) -> Option<ParsedEntry> {
    if is_sentinel(raw) {
        return None;
    }

    let entity_type = classify(raw);
    let (name, id_or_date) = split_entry(raw);
    let (first_name, surname) = split_name(&name, entity_type);

    Some(ParsedEntry {
        first_name,
        surname,
        id_or_date,
        entity_type,
    })
}

/// Case-insensitive comparison against the State entry
pub fn is_sentinel(raw: &str) -> bool {
    raw.to_lowercase() == SENTINEL_ENTRY.to_lowercase()
}

/// Individual iff the birthdate marker is present, Organization iff the
/// company code marker is, Unknown otherwise
pub fn classify(raw: &str) -> EntityType {
    let lower = raw.to_lowercase();

    if lower.contains(BIRTHDATE_MARKER) {
        EntityType::Individual
    } else if lower.contains(COMPANY_CODE_MARKER) {
        EntityType::Organization
    } else {
        EntityType::Unknown
    }
}

/// Split on the first marker into (name, id-or-date); no marker keeps the
/// whole entry as the name
pub fn split_entry(raw: &str) -> (String, String) {
    match ENTRY_SPLIT_RE.find(raw) {
        Some(m) => (
            raw[..m.start()].trim().to_string(),
            raw[m.end()..].trim().to_string(),
        ),
        None => (raw.to_string(), String::new()),
    }
}

/// First name / surname split; depends only on the token count for
/// individuals, organizations keep the whole name as "first name"
pub fn split_name(name: &str, entity_type: EntityType) -> (String, String) {
    if entity_type != EntityType::Individual {
        return (name.to_string(), String::new());
    }

    let tokens: Vec<&str> = name.split_whitespace().collect();

    match tokens.len() {
        0 | 1 => (name.to_string(), String::new()),
        // Two tokens: hyphenated surnames ("Petraitė-Jonaitienė") land here too
        2 => (tokens[0].to_string(), tokens[1].to_string()),
        n => (tokens[..n - 1].join(" "), tokens[n - 1].to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_individual() {
        let entry = parse_entry("Jonas Jonaitis, gim. 1980-01-01").unwrap();
        assert_eq!(entry.first_name, "Jonas");
        assert_eq!(entry.surname, "Jonaitis");
        assert_eq!(entry.id_or_date, "1980-01-01");
        assert_eq!(entry.entity_type, EntityType::Individual);
    }

    #[test]
    fn test_parse_organization() {
        let entry = parse_entry("UAB Forestas, a.k. 123456789").unwrap();
        assert_eq!(entry.first_name, "UAB Forestas");
        assert_eq!(entry.surname, "");
        assert_eq!(entry.id_or_date, "123456789");
        assert_eq!(entry.entity_type, EntityType::Organization);
    }

    #[test]
    fn test_parse_unknown_keeps_whole_text() {
        let entry = parse_entry("Bendrija Ąžuolas").unwrap();
        assert_eq!(entry.first_name, "Bendrija Ąžuolas");
        assert_eq!(entry.surname, "");
        assert_eq!(entry.id_or_date, "");
        assert_eq!(entry.entity_type, EntityType::Unknown);
    }

    #[test]
    fn test_sentinel_is_dropped_case_insensitive() {
        assert!(parse_entry("Lietuvos Respublika, a.k. 111105555").is_none());
        assert!(parse_entry("LIETUVOS RESPUBLIKA, A.K. 111105555").is_none());
        assert!(parse_entry("Lietuvos Respublika, a.k. 188710061").is_some());
    }

    #[test]
    fn test_marker_match_is_case_insensitive() {
        assert_eq!(classify("Ona Onaitė, GIM. 1950-02-02"), EntityType::Individual);
        let (name, date) = split_entry("Ona Onaitė, GIM. 1950-02-02");
        assert_eq!(name, "Ona Onaitė");
        assert_eq!(date, "1950-02-02");
    }

    #[test]
    fn test_split_only_on_first_marker() {
        let (name, rest) = split_entry("UAB Gim, a.k. 1, gim. 2");
        assert_eq!(name, "UAB Gim");
        assert_eq!(rest, "1, gim. 2");
    }

    #[test]
    fn test_marker_without_space_splits_but_stays_unknown() {
        // ",gim." is a split point but not the ", gim." type marker
        assert_eq!(classify("Jonas Jonaitis,gim. 1980-01-01"), EntityType::Unknown);
        let entry = parse_entry("Jonas Jonaitis,gim. 1980-01-01").unwrap();
        assert_eq!(entry.first_name, "Jonas Jonaitis");
        assert_eq!(entry.id_or_date, "1980-01-01");
    }

    #[test]
    fn test_split_name_one_token() {
        assert_eq!(
            split_name("Jonas", EntityType::Individual),
            ("Jonas".to_string(), String::new())
        );
    }

    #[test]
    fn test_split_name_two_tokens() {
        assert_eq!(
            split_name("Jonas Jonaitis", EntityType::Individual),
            ("Jonas".to_string(), "Jonaitis".to_string())
        );
    }

    #[test]
    fn test_split_name_two_tokens_hyphenated_surname() {
        assert_eq!(
            split_name("Ona Petraitė-Jonaitienė", EntityType::Individual),
            ("Ona".to_string(), "Petraitė-Jonaitienė".to_string())
        );
    }

    #[test]
    fn test_split_name_hyphenated_first_name() {
        assert_eq!(
            split_name("Ona-Marija Jonaitienė", EntityType::Individual),
            ("Ona-Marija".to_string(), "Jonaitienė".to_string())
        );
    }

    #[test]
    fn test_split_name_three_or_more_tokens() {
        assert_eq!(
            split_name("Jonas Petras Jonaitis", EntityType::Individual),
            ("Jonas Petras".to_string(), "Jonaitis".to_string())
        );
        assert_eq!(
            split_name("Jonas  Petras   Antanas Jonaitis", EntityType::Individual),
            ("Jonas Petras Antanas".to_string(), "Jonaitis".to_string())
        );
    }

    #[test]
    fn test_split_name_organization_never_splits() {
        assert_eq!(
            split_name("UAB Vėjo Jėga", EntityType::Organization),
            ("UAB Vėjo Jėga".to_string(), String::new())
        );
        assert_eq!(
            split_name("Kažkas Kitas", EntityType::Unknown),
            ("Kažkas Kitas".to_string(), String::new())
        );
    }
}
