//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::{CsvWriteOptions, LineTerminator};
use sheetmap_core::RawRow;

/// CSV file writer, used for exporting rejected rows
pub struct CsvWriter;

impl CsvWriter {
    /// Write rows to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        rows: &[RawRow],
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(rows, file, options)
    }

    /// Write rows to a writer. Rows may differ in length.
    pub fn write<W: Write>(rows: &[RawRow], writer: W, options: &CsvWriteOptions) -> CsvResult<()> {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .flexible(true)
            .from_writer(writer);

        for row in rows {
            csv_writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CsvReadOptions, CsvReader};
    use pretty_assertions::assert_eq;
    use sheetmap_core::RawCell;

    #[test]
    fn test_write_ragged_rows() {
        let rows = vec![
            vec![RawCell::text("index"), RawCell::text("reason")],
            vec![
                RawCell::Number(2.0),
                RawCell::text("missing required field"),
                RawCell::Empty,
                RawCell::text("a, b"),
            ],
        ];
        let mut out = Vec::new();
        CsvWriter::write(&rows, &mut out, &CsvWriteOptions::default()).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "index,reason\n2,missing required field,,\"a, b\"\n"
        );
    }

    #[test]
    fn test_written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rejects.csv");
        let rows = vec![
            vec![RawCell::text("Name"), RawCell::text("Fans")],
            vec![RawCell::text("Alice"), RawCell::Number(15000.0)],
        ];
        CsvWriter::write_file(&rows, &path, &CsvWriteOptions::default()).unwrap();

        let options = CsvReadOptions {
            auto_detect_numbers: true,
            ..Default::default()
        };
        let table = CsvReader::read_file(&path, &options).unwrap();
        assert_eq!(table, rows);
    }
}
