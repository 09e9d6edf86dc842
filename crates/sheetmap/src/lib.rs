//! # sheetmap
//!
//! Configuration-driven spreadsheet import.
//!
//! A [`MappingConfig`] names which spreadsheet columns land where: plain
//! fields on a primary entity document, monthly prices in its price history,
//! or metrics on a secondary snapshot document. Computed fields derive more
//! values with a small expression language.
//!
//! ## Features
//!
//! - Header-based column mapping with required fields and row rejection
//! - Number, percentage, date and text coercion of raw cells
//! - Price history keyed by (year, month, type), merged on re-import
//! - Snapshot documents linked to their entity and stamped with metadata
//! - A safe arithmetic/conditional expression language for computed fields
//! - CSV, TSV and JSON table input
//!
//! ## Example
//!
//! ```rust
//! use sheetmap::prelude::*;
//!
//! let catalog = ConfigCatalog::from_json_str(r#"[{
//!     "platform": "douyin",
//!     "name": "monthly",
//!     "rules": [
//!         {"excelHeader": "Nickname", "targetPath": "name", "required": true},
//!         {"excelHeader": "Plays", "targetPath": "metrics.plays", "format": "number", "targetCollection": "secondary"}
//!     ]
//! }]"#).unwrap();
//!
//! let table = CsvReader::read("Nickname,Plays\nAlice,1200\n".as_bytes(), &CsvReadOptions::default()).unwrap();
//! let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let request = ImportRequest::new("douyin", "monthly", PricePeriod::from_date(date), ImportContext::new(date));
//!
//! let output = catalog.import(&request, &table).unwrap();
//! assert_eq!(output.valid_data.len(), 1);
//! assert_eq!(output.secondary_data.len(), 1);
//! ```

pub mod import;
pub mod prelude;

pub use import::{CatalogImportExt, ImportRequest};

// Re-export core types
pub use sheetmap_core::{
    fields, is_blank_row, merge_prices, ComputedFieldConfig, ConfigCatalog, Document, Error,
    FieldFormat, Formula, ImportContext, LegacyOp, MappingConfig, MappingRule, PricePeriod,
    PriceRecord, PriceStatus, RawCell, RawRow, RawTable, Result, TargetCollection,
};

// Re-export expression types
pub use sheetmap_expr::{
    evaluate, evaluate_expression, parse_expression, validate_expression, BinaryOperator,
    ComparisonOperator, Expr, ExprError, ExprResult, ExpressionCheck, UnaryOperator, Value,
    Variables,
};

// Re-export mapping types
pub use sheetmap_mapping::{
    apply_mapping_rules, check_config, compute_field, unresolved_variables, upsert_document,
    IdGenerator, ImportSummary, InvalidRow, MappingEngine, MappingOutput, RandomIdGenerator,
    SequentialIdGenerator, UnresolvedVariable, EMPTY_ROW, MISSING_REQUIRED_FIELD,
};

// Re-export I/O types
pub use sheetmap_csv::{
    read_table, CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter, JsonTableReader,
};
