//! Raw cell values as delivered by the document source

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single raw cell.
///
/// Deserializes from plain JSON scalars: `null`, booleans, numbers and strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    /// Empty cell (no value)
    #[default]
    Empty,
    /// Boolean value
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value, untrimmed
    Text(String),
}

/// One row of raw cells
pub type RawRow = Vec<RawCell>;

/// A header row followed by data rows
pub type RawTable = Vec<RawRow>;

impl RawCell {
    /// Create a text cell
    pub fn text<S: Into<String>>(s: S) -> Self {
        RawCell::Text(s.into())
    }

    /// True for empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) | RawCell::Bool(_) => false,
        }
    }

    /// Textual form of the cell, `None` for empty cells
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) => Some(Cow::Borrowed(s.as_str())),
            RawCell::Number(n) => Some(Cow::Owned(format_number(*n))),
            RawCell::Bool(b) => Some(Cow::Owned(b.to_string())),
        }
    }
}

/// True when every cell of the row is empty or whitespace
pub fn is_blank_row(row: &[RawCell]) -> bool {
    row.iter().all(RawCell::is_blank)
}

/// Spreadsheet numbers are floats; integral values print without a fraction.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        RawCell::Text(s.to_string())
    }
}

impl From<String> for RawCell {
    fn from(s: String) -> Self {
        RawCell::Text(s)
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        RawCell::Number(n)
    }
}

impl From<bool> for RawCell {
    fn from(b: bool) -> Self {
        RawCell::Bool(b)
    }
}

impl<T: Into<RawCell>> From<Option<T>> for RawCell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawCell::Empty)
    }
}
