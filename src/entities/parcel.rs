// 🗺️ Parcel Entity - document-level metadata of one registry extract
//
// Every field degrades to an empty string when the extract does not carry it.

use serde::{Deserialize, Serialize};

// ============================================================================
// PARCEL RECORD
// ============================================================================

/// Metadata of a single land-registry extract (one per PDF)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParcelRecord {
    /// "Registro Nr." value
    pub registry_number: String,

    /// Parcel address line (the line after "Sudarymo data:")
    pub address: String,

    /// "Unikalus daikto numeris" value
    pub unique_number: String,

    /// Cadastral number, e.g. "5101/0003:123"
    pub cadastral_number: String,
}

impl ParcelRecord {
    pub fn new(
        registry_number: String,
        address: String,
        unique_number: String,
        cadastral_number: String,
    ) -> Self {
        ParcelRecord {
            registry_number,
            address,
            unique_number,
            cadastral_number,
        }
    }

    /// True when the extract yielded no metadata at all
    pub fn is_empty(&self) -> bool {
        self.registry_number.is_empty()
            && self.address.is_empty()
            && self.unique_number.is_empty()
            && self.cadastral_number.is_empty()
    }
}

// ============================================================================
// PROJECT INFO
// ============================================================================

/// Project values of a source directory (from its `<dir>.txt` info file)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// BENDRAS_NR - wind plant number, e.g. "VE12"
    pub plant_number: String,

    /// PROJEKTO_NR
    pub project_number: String,

    /// PAVADINIMAS
    pub project_name: String,
}

impl ProjectInfo {
    pub fn new(plant_number: String, project_number: String, project_name: String) -> Self {
        ProjectInfo {
            plant_number,
            project_number,
            project_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parcel_is_empty() {
        assert!(ParcelRecord::default().is_empty());
    }

    #[test]
    fn test_parcel_with_registry_number_is_not_empty() {
        let parcel = ParcelRecord::new(
            "44/123456".to_string(),
            String::new(),
            String::new(),
            String::new(),
        );
        assert!(!parcel.is_empty());
    }
}
