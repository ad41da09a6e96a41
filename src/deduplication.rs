// 🔍 Deduplication Engine - collapse repeated rows into a sorted set
//
// The same holder shows up once per document and often in several documents
// of a directory (one extract per parcel, same owners). Rows are values, so
// duplicates are exact: every field equal.

use crate::entities::EntityRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// DEDUPLICATION REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeduplicationReport {
    /// Rows fed in
    pub input_rows: usize,

    /// Rows left after collapsing
    pub unique_rows: usize,
}

impl DeduplicationReport {
    pub fn duplicates_removed(&self) -> usize {
        self.input_rows - self.unique_rows
    }
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

/// Accumulates rows across documents and yields them deduplicated and sorted
#[derive(Debug, Default)]
pub struct DeduplicationEngine {
    rows: BTreeSet<EntityRow>,
    input_rows: usize,
}

impl DeduplicationEngine {
    pub fn new() -> Self {
        DeduplicationEngine::default()
    }

    pub fn add(&mut self, row: EntityRow) {
        self.input_rows += 1;
        self.rows.insert(row);
    }

    pub fn extend<I: IntoIterator<Item = EntityRow>>(&mut self, rows: I) {
        for row in rows {
            self.add(row);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn report(&self) -> DeduplicationReport {
        DeduplicationReport {
            input_rows: self.input_rows,
            unique_rows: self.rows.len(),
        }
    }

    /// Sorted, deduplicated rows
    pub fn into_rows(self) -> Vec<EntityRow> {
        self.rows.into_iter().collect()
    }
}

/// One-shot helper: sort + dedup a row list
pub fn deduplicate(rows: Vec<EntityRow>) -> Vec<EntityRow> {
    let mut engine = DeduplicationEngine::new();
    engine.extend(rows);
    engine.into_rows()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityType, ParcelRecord, Role};

    fn create_test_row(registry: &str, role: Role, first: &str, surname: &str) -> EntityRow {
        let parcel = ParcelRecord::new(
            registry.to_string(),
            "Kauno r.".to_string(),
            "4400-0000".to_string(),
            "5230/0004:17".to_string(),
        );
        EntityRow::new(
            &parcel,
            role,
            first.to_string(),
            surname.to_string(),
            "1980-01-01".to_string(),
            EntityType::Individual,
        )
    }

    #[test]
    fn test_exact_duplicates_collapse() {
        let mut engine = DeduplicationEngine::new();
        engine.add(create_test_row("44/1", Role::Owner, "Jonas", "Jonaitis"));
        engine.add(create_test_row("44/1", Role::Owner, "Jonas", "Jonaitis"));

        assert_eq!(engine.len(), 1);
        let report = engine.report();
        assert_eq!(report.input_rows, 2);
        assert_eq!(report.duplicates_removed(), 1);
    }

    #[test]
    fn test_different_role_is_not_duplicate() {
        let rows = deduplicate(vec![
            create_test_row("44/1", Role::Owner, "Jonas", "Jonaitis"),
            create_test_row("44/1", Role::Tenant, "Jonas", "Jonaitis"),
        ]);
        assert_eq!(rows.len(), 2);
        // "Nuomininkas" sorts before "Savininkas"
        assert_eq!(rows[0].role, Role::Tenant);
    }

    #[test]
    fn test_case_differences_are_kept() {
        let rows = deduplicate(vec![
            create_test_row("44/1", Role::Owner, "JONAS", "Jonaitis"),
            create_test_row("44/1", Role::Owner, "Jonas", "Jonaitis"),
        ]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_output_is_sorted_by_registry_number_first() {
        let rows = deduplicate(vec![
            create_test_row("44/3", Role::Owner, "Antanas", "A"),
            create_test_row("44/1", Role::Owner, "Zigmas", "Z"),
            create_test_row("44/2", Role::Owner, "Mindaugas", "M"),
        ]);
        let registries: Vec<&str> = rows.iter().map(|r| r.parcel.registry_number.as_str()).collect();
        assert_eq!(registries, vec!["44/1", "44/2", "44/3"]);
    }

    #[test]
    fn test_deduplication_is_idempotent() {
        let input = vec![
            create_test_row("44/2", Role::Owner, "Ona", "Onaitė"),
            create_test_row("44/1", Role::Tenant, "Jonas", "Jonaitis"),
            create_test_row("44/2", Role::Owner, "Ona", "Onaitė"),
        ];
        let once = deduplicate(input);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_engine() {
        let engine = DeduplicationEngine::new();
        assert!(engine.is_empty());
        assert!(engine.into_rows().is_empty());
    }
}
