// Entity Models
// The typed rows the registry parser produces and the table writer consumes.
//
// - ParcelRecord: document-level metadata, one per PDF extract
// - ProjectInfo: the three project values shared by every row of a directory
// - EntityRow: one person/organization holding a role on a parcel

pub mod parcel;
pub mod holder;

pub use parcel::{ParcelRecord, ProjectInfo};
pub use holder::{EntityRow, EntityType, Role};
