//! # sheetmap-mapping
//!
//! Applies a [`MappingConfig`](sheetmap_core::MappingConfig) to a raw table.
//!
//! Each data row is coerced cell by cell into a primary document and,
//! when any secondary field is populated, a secondary snapshot document.
//! Computed fields run last and may read prices, metrics and primary fields.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use sheetmap_core::{FieldFormat, ImportContext, MappingConfig, MappingRule, PricePeriod, RawCell};
//! use sheetmap_mapping::{MappingEngine, SequentialIdGenerator};
//!
//! let config = MappingConfig::new("douyin", "monthly")
//!     .with_rule(MappingRule::new("Nickname", "name").required())
//!     .with_rule(MappingRule::price("Video", "video"));
//! let context = ImportContext::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
//! let period = PricePeriod::new(2024, 3).unwrap();
//!
//! let table = vec![
//!     vec![RawCell::text("Nickname"), RawCell::text("Video")],
//!     vec![RawCell::text("Alice"), RawCell::Number(1200.0)],
//!     vec![RawCell::Empty, RawCell::Number(80.0)],
//! ];
//!
//! let mut engine = MappingEngine::with_id_generator(&config, context, period, SequentialIdGenerator::new("s"));
//! let output = engine.apply(&table);
//!
//! assert_eq!(output.valid_data.len(), 1);
//! assert_eq!(output.valid_data[0].find_price("video").unwrap().price, 120_000);
//! assert_eq!(output.invalid_rows[0].field.as_deref(), Some("Nickname"));
//! ```

pub mod check;
pub mod coerce;
pub mod computed;
pub mod engine;
pub mod ids;
pub mod resolver;
pub mod summary;
pub mod upsert;

pub use check::{check_config, unresolved_variables, UnresolvedVariable};
pub use coerce::{coerce_cell, parse_date, parse_number, Coerced};
pub use computed::{compute_field, extract_variable_names, CompiledField};
pub use engine::{
    apply_mapping_rules, InvalidRow, MappingEngine, MappingOutput, EMPTY_ROW,
    MISSING_REQUIRED_FIELD,
};
pub use ids::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use resolver::resolve;
pub use summary::ImportSummary;
pub use upsert::upsert_document;
