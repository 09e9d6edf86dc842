//! Per-job import context

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;

/// Metadata stamped onto every secondary document of one import job.
///
/// `entity_ids` maps natural keys (the value found at `key_path` in a primary
/// document) to stored entity ids. It must be filled before the engine runs;
/// the engine never looks anything up on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportContext {
    pub snapshot_date: NaiveDate,
    pub snapshot_type: String,
    pub data_source: String,
    /// Dotted path of the natural key in primary documents
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub entity_ids: HashMap<String, String>,
}

impl ImportContext {
    /// Monthly spreadsheet snapshot taken on `snapshot_date`
    pub fn new(snapshot_date: NaiveDate) -> Self {
        Self {
            snapshot_date,
            snapshot_type: "monthly".to_string(),
            data_source: "spreadsheet".to_string(),
            key_path: None,
            entity_ids: HashMap::new(),
        }
    }

    pub fn with_snapshot_type<S: Into<String>>(mut self, snapshot_type: S) -> Self {
        self.snapshot_type = snapshot_type.into();
        self
    }

    pub fn with_data_source<S: Into<String>>(mut self, data_source: S) -> Self {
        self.data_source = data_source.into();
        self
    }

    pub fn with_key_path<S: Into<String>>(mut self, key_path: S) -> Self {
        self.key_path = Some(key_path.into());
        self
    }

    pub fn with_entity_ids(mut self, entity_ids: HashMap<String, String>) -> Self {
        self.entity_ids = entity_ids;
        self
    }

    /// Entity id for a primary document.
    ///
    /// The natural key is mapped through `entity_ids`; an unmapped key is used as-is.
    pub fn resolve_entity_id(&self, primary: &Document) -> Option<String> {
        let key = natural_key(primary.get_path(self.key_path.as_deref()?)?)?;
        Some(self.entity_ids.get(&key).cloned().unwrap_or(key))
    }
}

fn natural_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => Some((f as i64).to_string()),
            _ => Some(n.to_string()),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_resolve_through_lookup_table() {
        let mut ids = HashMap::new();
        ids.insert("star-42".to_string(), "64f0c1".to_string());
        let ctx = ImportContext::new(date())
            .with_key_path("external_id")
            .with_entity_ids(ids);

        let mut doc = Document::new();
        doc.set_path("external_id", json!("star-42"));
        assert_eq!(ctx.resolve_entity_id(&doc).as_deref(), Some("64f0c1"));

        doc.set_path("external_id", json!("star-7"));
        assert_eq!(ctx.resolve_entity_id(&doc).as_deref(), Some("star-7"));
    }

    #[test]
    fn test_numeric_keys() {
        let ctx = ImportContext::new(date()).with_key_path("uid");
        let mut doc = Document::new();
        doc.set_path("uid", json!(12345.0));
        assert_eq!(ctx.resolve_entity_id(&doc).as_deref(), Some("12345"));
    }

    #[test]
    fn test_unresolvable() {
        let ctx = ImportContext::new(date());
        let mut doc = Document::new();
        doc.set_path("uid", json!("x"));
        assert_eq!(ctx.resolve_entity_id(&doc), None);

        let ctx = ctx.with_key_path("uid");
        assert_eq!(ctx.resolve_entity_id(&Document::new()), None);
    }
}
