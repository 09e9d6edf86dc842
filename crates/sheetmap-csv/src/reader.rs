//! Table readers

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sheetmap_core::{RawCell, RawRow, RawTable};

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;

/// CSV file reader.
///
/// Every record becomes one row; the header is row 0. Rows keep their own
/// length, so ragged files are accepted.
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a raw table
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<RawTable> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into a raw table
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<RawTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut table = RawTable::new();
        for (index, result) in csv_reader.records().enumerate() {
            let record = result?;
            let row: RawRow = record
                .iter()
                .map(|field| {
                    // The header row always stays text
                    if index > 0 && options.auto_detect_numbers {
                        Self::detect_type(field, options.trim)
                    } else {
                        Self::text(field, options.trim)
                    }
                })
                .collect();
            table.push(row);
        }

        tracing::debug!(rows = table.len(), "read csv table");
        Ok(table)
    }

    fn text(field: &str, trim: bool) -> RawCell {
        let field = if trim { field.trim() } else { field };
        if field.is_empty() {
            RawCell::Empty
        } else {
            RawCell::text(field)
        }
    }

    /// Detect the type of a field value
    fn detect_type(field: &str, trim: bool) -> RawCell {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return RawCell::Empty;
        }

        // Plain decimal numbers only; anything decorated is left for coercion
        let plain = trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
        if plain {
            if let Ok(n) = trimmed.parse::<f64>() {
                // Leading zeros and digits beyond f64 precision stay text
                let cell = RawCell::Number(n);
                if n.is_finite() && cell.as_text().as_deref() == Some(trimmed) {
                    return cell;
                }
            }
        }

        Self::text(field, trim)
    }
}

/// Reader for tables stored as a JSON array of rows.
///
/// Cells may be strings, numbers, booleans or null.
pub struct JsonTableReader;

impl JsonTableReader {
    pub fn read_file<P: AsRef<Path>>(path: P) -> CsvResult<RawTable> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    pub fn read<R: Read>(reader: R) -> CsvResult<RawTable> {
        let table: RawTable = serde_json::from_reader(reader)?;
        tracing::debug!(rows = table.len(), "read json table");
        Ok(table)
    }
}

/// Read a table file, choosing the format by extension.
///
/// `.json` is a JSON array of rows, `.tsv` is tab separated, `.csv` and
/// `.txt` use `options` as given.
pub fn read_table<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<RawTable> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => JsonTableReader::read_file(path),
        "tsv" => CsvReader::read_file(
            path,
            &CsvReadOptions {
                delimiter: b'\t',
                ..options.clone()
            },
        ),
        "csv" | "txt" => CsvReader::read_file(path, options),
        other => Err(CsvError::UnsupportedFormat(other.to_string())),
    }
}
