//! Prelude module - common imports for sheetmap users
//!
//! ```rust
//! use sheetmap::prelude::*;
//! ```

pub use crate::{
    // Extension traits
    CatalogImportExt,
    // Configuration
    ComputedFieldConfig,
    ConfigCatalog,
    // I/O types
    CsvReadOptions,
    CsvReader,
    // Documents
    Document,
    // Error types
    Error,
    FieldFormat,
    Formula,
    ImportContext,
    ImportRequest,
    ImportSummary,
    InvalidRow,
    MappingConfig,
    MappingEngine,
    MappingOutput,
    MappingRule,
    PricePeriod,
    PriceRecord,
    RawCell,
    Result,
    TargetCollection,
};
