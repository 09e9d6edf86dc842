//! # sheetmap-core
//!
//! Core data model for the sheetmap import pipeline.
//!
//! This crate provides the types shared by the expression engine, the mapping
//! engine and the command-line tool:
//! - [`RawCell`] / [`RawTable`] - spreadsheet-shaped input (header row + data rows)
//! - [`Document`] - a JSON object addressed by dotted paths (`metrics.expected_plays`)
//! - [`MappingRule`], [`ComputedFieldConfig`], [`MappingConfig`] - declarative per-platform configuration
//! - [`PriceRecord`] and [`merge_prices`] - monthly price history with (year, month, type) slots
//! - [`ImportContext`] - per-job snapshot metadata and pre-resolved entity ids
//!
//! ## Example
//!
//! ```rust
//! use sheetmap_core::{merge_prices, PriceRecord};
//!
//! let existing = vec![PriceRecord::confirmed(2024, 1, "video", 1000)];
//! let incoming = vec![PriceRecord::confirmed(2024, 1, "video", 1500)];
//!
//! let merged = merge_prices(&existing, &incoming);
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].price, 1500);
//! ```

pub mod cell;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod price;

// Re-exports for convenience
pub use cell::{is_blank_row, RawCell, RawRow, RawTable};
pub use config::{
    ComputedFieldConfig, ConfigCatalog, FieldFormat, Formula, LegacyOp, MappingConfig,
    MappingRule, TargetCollection,
};
pub use context::ImportContext;
pub use document::{fields, Document};
pub use error::{Error, Result};
pub use price::{merge_prices, PricePeriod, PriceRecord, PriceStatus};
