// Transit Insights - Core Library
// Ticket sales + scheduled services + fare validations → dashboard bundle
// Exposes all modules for use in CLI, API server, and tests

pub mod records;
pub mod config;
pub mod parser;
pub mod normalizer;     // Field Normalizer
pub mod user_types;     // User-Type Resolver
pub mod join;           // Record Joiner
pub mod data_quality;   // Quality Filter
pub mod facets;         // Facet Extractor
pub mod filters;        // Filter Applier
pub mod aggregators;    // KPI, Heatmap, Top-Users, Loyalty
pub mod pipeline;

// Re-export commonly used types
pub use records::{FileData, RawRecord, RawValue, SourceKind};
pub use config::{ColumnMap, PassType, PipelineConfig};
pub use parser::{
    detect_source, get_parser, load_source, parse_csv_reader,
    CsvRecordParser, FileFormat, JsonRecordParser, RecordParser,
};
pub use normalizer::{
    normalize_date, normalize_row, normalize_string, normalize_user_type, NormalizedRow,
};
pub use user_types::{Ticket, UserTypeMap};
pub use join::{EnrichedValidation, ServiceIndex};
pub use data_quality::{QualityFilter, QualityOutcome, QualitySummary};
pub use facets::FilterOptions;
pub use filters::{FilterSelection, FilteredView};
pub use aggregators::{
    HeatmapData, HeatmapRow, HeatmapView, Kpi, LoyaltyData, LoyaltyPoint, TopUser,
};
pub use pipeline::{process_files, InsightsEngine, PreparedDataset, ProcessedData};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
