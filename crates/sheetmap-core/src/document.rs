//! Output documents addressed by dotted paths

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::price::PriceRecord;

/// Well-known document field names
pub mod fields {
    /// Price history list on primary documents
    pub const PRICES: &str = "prices";
    /// Foreign key from a secondary document to its primary entity
    pub const ENTITY_ID: &str = "entity_id";
    /// Generated snapshot identifier
    pub const SNAPSHOT_ID: &str = "snapshot_id";
    /// Snapshot date (ISO `YYYY-MM-DD`)
    pub const SNAPSHOT_DATE: &str = "snapshot_date";
    /// Snapshot kind, e.g. `monthly`
    pub const SNAPSHOT_TYPE: &str = "snapshot_type";
    /// Where the snapshot came from
    pub const DATA_SOURCE: &str = "data_source";
}

/// A nested JSON object built by applying mapping rules.
///
/// Paths are dot separated; every segment but the last names an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Top-level field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Top-level field assignment
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Resolve a dotted path. Missing keys and non-object intermediates yield `None`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Resolve a dotted path to a number.
    ///
    /// Numeric strings are accepted since spreadsheet sources often deliver them.
    pub fn get_number(&self, path: &str) -> Option<f64> {
        match self.get_path(path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Assign a value at a dotted path, creating intermediate objects.
    ///
    /// An intermediate that is not an object is replaced by one.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in segments {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(map) = slot else {
                return;
            };
            current = map;
        }
        current.insert(last.to_string(), value);
    }

    /// Price records stored under [`fields::PRICES`]. Malformed entries are skipped.
    pub fn prices(&self) -> Vec<PriceRecord> {
        match self.0.get(fields::PRICES) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// First price record with the given type tag
    pub fn find_price(&self, price_type: &str) -> Option<PriceRecord> {
        self.prices()
            .into_iter()
            .find(|record| record.price_type == price_type)
    }

    /// Replace the price list
    pub fn set_prices(&mut self, prices: Vec<PriceRecord>) {
        let items = prices
            .into_iter()
            .filter_map(|record| serde_json::to_value(record).ok())
            .collect();
        self.0.insert(fields::PRICES.to_string(), Value::Array(items));
    }

    /// Add price records, keeping one record per (year, month, type).
    ///
    /// Works on the stored JSON directly: a matching entry is updated in place
    /// and keeps any extra keys, every other stored entry is left untouched
    /// even when it does not parse as a [`PriceRecord`].
    pub fn merge_prices(&mut self, incoming: &[PriceRecord]) {
        let slot = self
            .0
            .entry(fields::PRICES)
            .or_insert_with(|| Value::Array(Vec::new()));
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        let Value::Array(items) = slot else {
            tracing::warn!("stored prices is not a list; leaving it unchanged");
            return;
        };

        for record in incoming {
            let Ok(Value::Object(fresh)) = serde_json::to_value(record) else {
                continue;
            };
            match items.iter_mut().find(|item| occupies_slot(item, record)) {
                Some(Value::Object(stored)) => stored.extend(fresh),
                _ => items.push(Value::Object(fresh)),
            }
        }
    }
}

/// Lenient `(year, month, type)` match against a stored price entry
fn occupies_slot(item: &Value, record: &PriceRecord) -> bool {
    let Some(entry) = item.as_object() else {
        return false;
    };
    whole_number(entry.get("year")) == Some(i64::from(record.year))
        && whole_number(entry.get("month")) == Some(i64::from(record.month))
        && entry.get("type").and_then(Value::as_str) == Some(record.price_type.as_str())
}

fn whole_number(value: Option<&Value>) -> Option<i64> {
    let Value::Number(n) = value? else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
            .map(|f| f as i64)
    })
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}
