//! Declarative mapping configuration
//!
//! A [`MappingConfig`] is an ordered list of [`MappingRule`]s plus optional
//! [`ComputedFieldConfig`]s, registered per platform under a configuration name.
//! Configurations are supplied as JSON with camelCase keys:
//!
//! ```json
//! {
//!   "platform": "douyin",
//!   "name": "monthly",
//!   "rules": [
//!     { "excelHeader": "Nickname", "targetPath": "name", "required": true },
//!     { "excelHeader": "60s+ video", "targetPath": "prices", "format": "number", "priceType": "video_60plus" },
//!     { "excelHeader": "Expected plays", "targetPath": "metrics.expected_plays",
//!       "format": "number", "targetCollection": "secondary" }
//!   ],
//!   "computedFields": [
//!     { "name": "cpm", "targetPath": "metrics.cpm", "targetCollection": "secondary",
//!       "formula": { "expression": "prices.video_60plus / metrics.expected_plays * 1000", "precision": 2 } }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::fields;
use crate::error::{Error, Result};

/// How a raw cell is coerced before it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    #[default]
    Text,
    Number,
    Percentage,
    Date,
}

/// Which output document a rule or computed field writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetCollection {
    /// The entity record
    #[default]
    Primary,
    /// The time-series snapshot record
    Secondary,
}

impl fmt::Display for TargetCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetCollection::Primary => f.write_str("primary"),
            TargetCollection::Secondary => f.write_str("secondary"),
        }
    }
}

/// Maps one spreadsheet column onto one document field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    /// Exact header text of the source column
    pub excel_header: String,
    /// Dotted destination path
    pub target_path: String,
    #[serde(default)]
    pub format: FieldFormat,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_collection: Option<TargetCollection>,
    /// Only meaningful when `target_path` is `prices`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_type: Option<String>,
}

impl MappingRule {
    /// A non-required text rule for the primary collection
    pub fn new<H: Into<String>, P: Into<String>>(excel_header: H, target_path: P) -> Self {
        Self {
            excel_header: excel_header.into(),
            target_path: target_path.into(),
            format: FieldFormat::Text,
            required: false,
            target_collection: None,
            price_type: None,
        }
    }

    /// A price column booked under `price_type`
    pub fn price<H: Into<String>, T: Into<String>>(excel_header: H, price_type: T) -> Self {
        Self {
            format: FieldFormat::Number,
            price_type: Some(price_type.into()),
            ..Self::new(excel_header, fields::PRICES)
        }
    }

    pub fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = format;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn secondary(mut self) -> Self {
        self.target_collection = Some(TargetCollection::Secondary);
        self
    }

    /// Effective target collection (primary when unset)
    pub fn collection(&self) -> TargetCollection {
        self.target_collection.unwrap_or_default()
    }

    /// The price type when this rule feeds the price history
    pub fn price_type(&self) -> Option<&str> {
        if self.target_path == fields::PRICES {
            self.price_type.as_deref()
        } else {
            None
        }
    }
}

/// Operator of a legacy two-operand formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyOp {
    Division,
    Multiplication,
    Addition,
    Subtraction,
}

/// How a computed field derives its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FormulaSpec", into = "FormulaSpec")]
pub enum Formula {
    /// A full DSL expression
    Expression {
        expression: String,
        precision: Option<u32>,
    },
    /// `operand1 <op> operand2`, times `multiplier`
    Legacy {
        op: LegacyOp,
        operand1: String,
        operand2: Option<String>,
        multiplier: Option<f64>,
        precision: Option<u32>,
    },
}

impl Formula {
    /// An expression formula without rounding
    pub fn expression<S: Into<String>>(expression: S) -> Self {
        Formula::Expression {
            expression: expression.into(),
            precision: None,
        }
    }

    /// Decimal places to round the result to
    pub fn precision(&self) -> Option<u32> {
        match self {
            Formula::Expression { precision, .. } | Formula::Legacy { precision, .. } => *precision,
        }
    }

    /// Same formula rounded to `digits` decimal places
    pub fn with_precision(mut self, digits: u32) -> Self {
        match &mut self {
            Formula::Expression { precision, .. } | Formula::Legacy { precision, .. } => {
                *precision = Some(digits)
            }
        }
        self
    }
}

/// Wire shape of a formula: both forms share one JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FormulaSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    op: Option<LegacyOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operand1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operand2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    precision: Option<u32>,
}

impl TryFrom<FormulaSpec> for Formula {
    type Error = String;

    fn try_from(spec: FormulaSpec) -> std::result::Result<Self, Self::Error> {
        // The expression form wins when both are present.
        if let Some(expression) = spec.expression {
            return Ok(Formula::Expression {
                expression,
                precision: spec.precision,
            });
        }

        let op = spec
            .op
            .ok_or_else(|| "formula needs either `expression` or `type`".to_string())?;
        let operand1 = spec
            .operand1
            .ok_or_else(|| "legacy formula requires `operand1`".to_string())?;

        Ok(Formula::Legacy {
            op,
            operand1,
            operand2: spec.operand2,
            multiplier: spec.multiplier,
            precision: spec.precision,
        })
    }
}

impl From<Formula> for FormulaSpec {
    fn from(formula: Formula) -> Self {
        match formula {
            Formula::Expression {
                expression,
                precision,
            } => FormulaSpec {
                expression: Some(expression),
                precision,
                ..FormulaSpec::default()
            },
            Formula::Legacy {
                op,
                operand1,
                operand2,
                multiplier,
                precision,
            } => FormulaSpec {
                op: Some(op),
                operand1: Some(operand1),
                operand2,
                multiplier,
                precision,
                ..FormulaSpec::default()
            },
        }
    }
}

/// A field derived after mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedFieldConfig {
    pub name: String,
    pub target_path: String,
    #[serde(default)]
    pub target_collection: TargetCollection,
    pub formula: Formula,
}

impl ComputedFieldConfig {
    pub fn new<N: Into<String>, P: Into<String>>(
        name: N,
        target_path: P,
        target_collection: TargetCollection,
        formula: Formula,
    ) -> Self {
        Self {
            name: name.into(),
            target_path: target_path.into(),
            target_collection,
            formula,
        }
    }
}

/// A named mapping configuration for one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    pub platform: String,
    pub name: String,
    pub rules: Vec<MappingRule>,
    #[serde(default)]
    pub computed_fields: Vec<ComputedFieldConfig>,
}

impl MappingConfig {
    pub fn new<P: Into<String>, N: Into<String>>(platform: P, name: N) -> Self {
        Self {
            platform: platform.into(),
            name: name.into(),
            rules: Vec::new(),
            computed_fields: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: MappingRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_computed_field(mut self, field: ComputedFieldConfig) -> Self {
        self.computed_fields.push(field);
        self
    }

    /// Check the structural invariants of the rule set.
    ///
    /// Expression syntax is not checked here; see `sheetmap_mapping::check_config`.
    pub fn validate(&self) -> Result<()> {
        let mut owners: HashSet<(TargetCollection, &str, Option<&str>)> = HashSet::new();

        for rule in &self.rules {
            let header = rule.excel_header.as_str();
            if header.trim().is_empty() {
                return Err(Error::invalid_rule(header, "empty excel header"));
            }
            if rule.target_path.trim().is_empty() {
                return Err(Error::invalid_rule(header, "empty target path"));
            }
            if rule.target_path.split('.').any(str::is_empty) {
                return Err(Error::invalid_rule(header, "target path has an empty segment"));
            }

            let is_prices = rule.target_path == fields::PRICES;
            if !is_prices
                && rule.collection() == TargetCollection::Primary
                && under_prices(&rule.target_path)
            {
                return Err(Error::invalid_rule(
                    header,
                    format!("\"{}\" is reserved for price history", fields::PRICES),
                ));
            }
            if rule.price_type.is_some() && !is_prices {
                return Err(Error::invalid_rule(
                    header,
                    format!("priceType requires targetPath \"{}\"", fields::PRICES),
                ));
            }
            if is_prices && rule.collection() == TargetCollection::Primary {
                match rule.price_type.as_deref() {
                    None => return Err(Error::invalid_rule(header, "price column without priceType")),
                    Some(t) if t.trim().is_empty() => {
                        return Err(Error::invalid_rule(header, "empty priceType"))
                    }
                    Some(_) => {}
                }
            }
            if rule.price_type.is_some() && rule.collection() == TargetCollection::Secondary {
                return Err(Error::invalid_rule(
                    header,
                    "price columns must target the primary collection",
                ));
            }

            let key = (
                rule.collection(),
                rule.target_path.as_str(),
                rule.price_type.as_deref(),
            );
            if !owners.insert(key) {
                return Err(Error::DuplicateTarget {
                    collection: rule.collection(),
                    path: match rule.price_type.as_deref() {
                        Some(t) => format!("{}[{}]", rule.target_path, t),
                        None => rule.target_path.clone(),
                    },
                });
            }
        }

        for field in &self.computed_fields {
            if field.name.trim().is_empty() {
                return Err(Error::InvalidComputedField {
                    name: field.name.clone(),
                    message: "empty name".into(),
                });
            }
            if field.target_path.split('.').any(|s| s.trim().is_empty()) {
                return Err(Error::InvalidComputedField {
                    name: field.name.clone(),
                    message: "empty target path segment".into(),
                });
            }
            if field.target_collection == TargetCollection::Primary
                && under_prices(&field.target_path)
            {
                return Err(Error::InvalidComputedField {
                    name: field.name.clone(),
                    message: format!("\"{}\" is reserved for price history", fields::PRICES),
                });
            }
            if let Formula::Expression { expression, .. } = &field.formula {
                if expression.trim().is_empty() {
                    return Err(Error::InvalidComputedField {
                        name: field.name.clone(),
                        message: "empty expression".into(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// True for `prices` and anything below it
fn under_prices(path: &str) -> bool {
    path.split('.').next() == Some(fields::PRICES)
}

/// All mapping configurations known to an import, keyed by (platform, name)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigCatalog {
    #[serde(default)]
    configs: Vec<MappingConfig>,
}

impl ConfigCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from JSON: either `{"configs": [...]}` or a bare array
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Read a catalog from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    /// Read a catalog from a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_value(value: serde_json::Value) -> Result<Self> {
        let catalog = if value.is_array() {
            Self {
                configs: serde_json::from_value(value)?,
            }
        } else {
            serde_json::from_value(value)?
        };
        tracing::debug!(configs = catalog.configs.len(), "loaded mapping catalog");
        Ok(catalog)
    }

    /// Register a configuration, replacing any with the same key
    pub fn insert(&mut self, config: MappingConfig) {
        match self
            .configs
            .iter_mut()
            .find(|c| c.platform == config.platform && c.name == config.name)
        {
            Some(slot) => *slot = config,
            None => self.configs.push(config),
        }
    }

    /// Look up a configuration by platform and name
    pub fn get(&self, platform: &str, name: &str) -> Result<&MappingConfig> {
        self.configs
            .iter()
            .find(|c| c.platform == platform && c.name == name)
            .ok_or_else(|| Error::UnknownConfig {
                platform: platform.to_string(),
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingConfig> {
        self.configs.iter()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
