// Parcel Notice - Core Library
// Registry extracts in, notification letters out. Exposes every batch step
// for the CLI and for tests.

pub mod config;         // Settings: parcel-notice.toml + environment
pub mod entities;       // Parcel metadata, project info, entity rows
pub mod entry;          // One holder entry: classify, split name
pub mod role_block;     // Role-labelled block scanner
pub mod pdf;            // PDF text sources
pub mod parser;         // Registry extract text → rows
pub mod deduplication;  // Distinct rows, sorted
pub mod table;          // 14-column table I/O and aggregation
pub mod project_info;   // Per-directory project info files
pub mod pipeline;       // Directory-level extraction runs
pub mod enrichment;     // Declared residence lookup
pub mod docx;           // Minimal WordprocessingML model
pub mod letters;        // Letter generation from the template
pub mod tidy;           // Letter clean-up and signature
pub mod inspect;        // Template structure dump

// Re-export commonly used types
pub use config::{ConfigError, Settings};
pub use entities::{EntityRow, EntityType, ParcelRecord, ProjectInfo, Role};
pub use entry::{classify, parse_entry, split_name, ParsedEntry};
pub use role_block::{scan_role_block, BlockState, RoleBlockScanner};
pub use pdf::{MemoryTextSource, PdfTextSource, TextSource};
pub use parser::{parse_text, ParsedDocument, RegistryParser};
pub use deduplication::{deduplicate, DeduplicationEngine, DeduplicationReport};
pub use table::{aggregate_tables, read_table, write_table, TABLE_HEADER};
pub use project_info::{read_project_info, write_info_files};
pub use pipeline::{DirectoryReport, ExtractSummary, Extractor};
pub use enrichment::{
    AddressLookup, DeclaredAddress, Enricher, EnrichmentSummary, HttpAddressLookup,
    LookupCache, PersonQuery,
};
pub use letters::{generate_letters, LetterGenerator, LetterSummary, Recipient};
pub use tidy::{tidy_directory, TidySummary};
pub use inspect::DocumentReport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
