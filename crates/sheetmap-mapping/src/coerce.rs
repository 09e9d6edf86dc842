//! Cell coercion by field format

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use lazy_regex::regex_captures;
use serde_json::Value;
use sheetmap_core::{FieldFormat, RawCell};

/// Outcome of coercing one cell
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// A value ready to store
    Value(Value),
    /// Empty or whitespace-only cell
    Missing,
    /// The cell has content the format cannot read
    Invalid(String),
}

/// A number read from cell text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedNumber {
    pub value: f64,
    /// A literal `%` was present
    pub percent: bool,
}

/// Parse spreadsheet number text.
///
/// Accepts thousands separators (`,` and `，`), an optional leading currency sign,
/// a `万`/`w` suffix (×10,000) and a trailing `%`. The percent sign is only
/// reported, not applied.
pub fn parse_number(text: &str) -> Option<ParsedNumber> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '，') && !c.is_whitespace())
        .collect();

    let (_, digits, ten_thousands, percent) = regex_captures!(
        r"^[¥￥$]?([+-]?(?:\d+(?:\.\d*)?|\.\d+))(万|[wW])?(%|％)?$",
        &cleaned
    )?;

    let mut value: f64 = digits.parse().ok()?;
    if !ten_thousands.is_empty() {
        value *= 10_000.0;
    }
    Some(ParsedNumber {
        value,
        percent: !percent.is_empty(),
    })
}

/// Excel's 1900 date system counts from 1899-12-30
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Parse a date cell: ISO and common CJK layouts, RFC 3339, or a serial number
pub fn parse_date(cell: &RawCell) -> Option<NaiveDate> {
    let text = match cell {
        RawCell::Number(n) => return from_serial(*n),
        RawCell::Text(s) => s.trim(),
        RawCell::Empty | RawCell::Bool(_) => return None,
    };

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    text.parse::<f64>().ok().and_then(from_serial)
}

/// JSON number, integral values stored as integers
pub fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Some(Value::from(n as i64))
    } else {
        serde_json::Number::from_f64(n).map(Value::Number)
    }
}

fn numeric(cell: &RawCell) -> Option<ParsedNumber> {
    match cell {
        RawCell::Number(n) => Some(ParsedNumber {
            value: *n,
            percent: false,
        }),
        RawCell::Bool(b) => Some(ParsedNumber {
            value: if *b { 1.0 } else { 0.0 },
            percent: false,
        }),
        RawCell::Text(s) => parse_number(s),
        RawCell::Empty => None,
    }
}

/// Read a cell as a plain number (percent sign ignored)
pub fn coerce_number(cell: &RawCell) -> Option<f64> {
    numeric(cell).map(|n| n.value).filter(|n| n.is_finite())
}

/// Coerce a cell according to `format`
pub fn coerce_cell(cell: &RawCell, format: FieldFormat) -> Coerced {
    if cell.is_blank() {
        return Coerced::Missing;
    }

    match format {
        FieldFormat::Text => match cell.as_text() {
            Some(text) => Coerced::Value(Value::String(text.trim().to_string())),
            None => Coerced::Missing,
        },
        FieldFormat::Number | FieldFormat::Percentage => {
            let Some(parsed) = numeric(cell) else {
                return Coerced::Invalid(format!("'{}' is not a number", cell));
            };
            let value = if format == FieldFormat::Percentage && parsed.percent {
                parsed.value / 100.0
            } else {
                parsed.value
            };
            match number_value(value) {
                Some(v) => Coerced::Value(v),
                None => Coerced::Invalid(format!("'{}' is not a finite number", cell)),
            }
        }
        FieldFormat::Date => match parse_date(cell) {
            Some(date) => Coerced::Value(Value::String(date.format("%Y-%m-%d").to_string())),
            None => Coerced::Invalid(format!("'{}' is not a date", cell)),
        },
    }
}
