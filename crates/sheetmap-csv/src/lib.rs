//! # sheetmap-csv
//!
//! Raw table input for sheetmap: CSV/TSV files and JSON arrays of rows,
//! plus a CSV writer for exporting rejected rows.

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::{read_table, CsvReader, JsonTableReader};
pub use writer::CsvWriter;
