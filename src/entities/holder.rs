// 👥 Holder Entity - one person/organization holding a role on a parcel
//
// Rows are plain values: equality is full field equality and ordering is the
// lexicographic order of the table columns, so a sorted, deduplicated set of
// rows is exactly what ends up in the output table.

use super::parcel::{ParcelRecord, ProjectInfo};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// ROLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Savininkas
    Owner,

    /// Nuomininkas
    Tenant,

    /// Patikėtinis
    Trustee,

    /// Panaudos gavėjas
    PermitHolder,
}

impl Role {
    /// Label as printed in the registry extract and written to the table
    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "Savininkas",
            Role::Tenant => "Nuomininkas",
            Role::Trustee => "Patikėtinis",
            Role::PermitHolder => "Panaudos gavėjas",
        }
    }

    /// Roles that appear as line-leading blocks (permit holders are matched anywhere)
    pub fn block_roles() -> [Role; 3] {
        [Role::Owner, Role::Tenant, Role::Trustee]
    }

    pub fn from_label(label: &str) -> Option<Role> {
        [Role::Owner, Role::Tenant, Role::Trustee, Role::PermitHolder]
            .into_iter()
            .find(|role| role.label().eq_ignore_ascii_case(label.trim()))
    }
}

// ============================================================================
// ENTITY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// Natural person (entry carries ", gim." birthdate marker)
    Individual,

    /// Legal entity (entry carries ", a.k." company code marker)
    Organization,

    /// Neither marker present
    Unknown,
}

impl EntityType {
    /// Code written to the "Tipas" column
    pub fn code(&self) -> &'static str {
        match self {
            EntityType::Individual => "fizinis",
            EntityType::Organization => "juridinis",
            EntityType::Unknown => "",
        }
    }

    pub fn from_code(code: &str) -> EntityType {
        match code.trim().to_lowercase().as_str() {
            "fizinis" => EntityType::Individual,
            "juridinis" => EntityType::Organization,
            _ => EntityType::Unknown,
        }
    }
}

// ============================================================================
// ENTITY ROW
// ============================================================================

/// One output row: parcel metadata (denormalized) + holder + project values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRow {
    pub parcel: ParcelRecord,
    pub role: Role,
    pub first_name: String,
    pub surname: String,

    /// Birth date for individuals, company code for organizations
    pub id_or_date: String,

    pub entity_type: EntityType,
    pub project: ProjectInfo,
}

impl EntityRow {
    pub fn new(
        parcel: &ParcelRecord,
        role: Role,
        first_name: String,
        surname: String,
        id_or_date: String,
        entity_type: EntityType,
    ) -> Self {
        EntityRow {
            parcel: parcel.clone(),
            role,
            first_name,
            surname,
            id_or_date,
            entity_type,
            project: ProjectInfo::default(),
        }
    }

    /// Builder pattern: attach the directory's project values
    pub fn with_project(mut self, project: &ProjectInfo) -> Self {
        self.project = project.clone();
        self
    }

    /// The extracted columns in table order (declared address columns excluded)
    pub fn columns(&self) -> [&str; 12] {
        [
            self.parcel.registry_number.as_str(),
            self.parcel.address.as_str(),
            self.parcel.unique_number.as_str(),
            self.parcel.cadastral_number.as_str(),
            self.role.label(),
            self.first_name.as_str(),
            self.surname.as_str(),
            self.id_or_date.as_str(),
            self.entity_type.code(),
            self.project.plant_number.as_str(),
            self.project.project_number.as_str(),
            self.project.project_name.as_str(),
        ]
    }

    /// Full table record; declared address and postal code start empty
    pub fn to_record(&self) -> Vec<String> {
        let mut record: Vec<String> = self.columns().iter().map(|c| c.to_string()).collect();
        record.push(String::new());
        record.push(String::new());
        record
    }
}

impl Ord for EntityRow {
    fn cmp(&self, other: &Self) -> Ordering {
        self.columns().cmp(&other.columns())
    }
}

impl PartialOrd for EntityRow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
