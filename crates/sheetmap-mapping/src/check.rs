//! Configuration checks that need the expression language

use serde::Serialize;
use sheetmap_core::{Error, Formula, MappingConfig, Result, TargetCollection};
use sheetmap_expr::validate_expression;

use crate::computed::extract_variable_names;
use crate::resolver::{METRICS_PREFIX, PRICE_PREFIX};

/// Validate a configuration completely: rule structure plus expression syntax
pub fn check_config(config: &MappingConfig) -> Result<()> {
    config.validate()?;

    for field in &config.computed_fields {
        if let Formula::Expression { expression, .. } = &field.formula {
            let check = validate_expression(expression);
            if !check.valid {
                return Err(Error::InvalidComputedField {
                    name: field.name.clone(),
                    message: check.error.unwrap_or_default(),
                });
            }
        }
    }

    for unknown in unresolved_variables(config) {
        tracing::warn!(
            field = %unknown.field,
            variable = %unknown.variable,
            "variable is not produced by any rule"
        );
    }
    Ok(())
}

/// A computed-field variable that no rule or earlier computed field writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedVariable {
    pub field: String,
    pub variable: String,
}

/// Variables that will always resolve to null for this configuration.
///
/// Not an error: the field is simply omitted on every row.
pub fn unresolved_variables(config: &MappingConfig) -> Vec<UnresolvedVariable> {
    let mut known: Vec<String> = Vec::new();
    for rule in &config.rules {
        match rule.price_type() {
            Some(price_type) => known.push(format!("{}{}", PRICE_PREFIX, price_type)),
            None => known.push(rule.target_path.clone()),
        }
    }

    let mut unresolved = Vec::new();
    for field in &config.computed_fields {
        let variables = match &field.formula {
            Formula::Expression { expression, .. } => extract_variable_names(expression),
            Formula::Legacy {
                operand1, operand2, ..
            } => std::iter::once(operand1.clone())
                .chain(operand2.clone())
                .collect(),
        };

        for variable in variables {
            if !known.contains(&variable) {
                unresolved.push(UnresolvedVariable {
                    field: field.name.clone(),
                    variable,
                });
            }
        }

        // Later fields may read this one, but only where the resolver looks
        let readable = match field.target_collection {
            TargetCollection::Secondary => field.target_path.starts_with(METRICS_PREFIX),
            TargetCollection::Primary => !field.target_path.starts_with(METRICS_PREFIX),
        };
        if readable {
            known.push(field.target_path.clone());
        }
    }
    unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetmap_core::{ComputedFieldConfig, FieldFormat, LegacyOp, MappingRule};

    fn base() -> MappingConfig {
        MappingConfig::new("douyin", "monthly")
            .with_rule(MappingRule::new("Nickname", "name").required())
            .with_rule(MappingRule::new("Fans", "fans").with_format(FieldFormat::Number))
            .with_rule(
                MappingRule::new("Plays", "metrics.expected_plays")
                    .with_format(FieldFormat::Number)
                    .secondary(),
            )
            .with_rule(MappingRule::price("Video", "video_60plus"))
    }

    fn secondary(name: &str, formula: Formula) -> ComputedFieldConfig {
        ComputedFieldConfig::new(name, format!("metrics.{}", name), TargetCollection::Secondary, formula)
    }

    #[test]
    fn test_valid_config_passes() {
        let config = base().with_computed_field(secondary(
            "cpm",
            Formula::expression("prices.video_60plus / metrics.expected_plays * 1000"),
        ));
        assert!(check_config(&config).is_ok());
        assert!(unresolved_variables(&config).is_empty());
    }

    #[test]
    fn test_bad_expression_is_rejected() {
        let config = base().with_computed_field(secondary("cpm", Formula::expression("fans +")));
        match check_config(&config) {
            Err(Error::InvalidComputedField { name, message }) => {
                assert_eq!(name, "cpm");
                assert!(message.starts_with("Parse error"), "{}", message);
            }
            other => panic!("expected InvalidComputedField, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_function_is_rejected() {
        let config = base().with_computed_field(secondary("x", Formula::expression("median(fans)")));
        assert!(matches!(
            check_config(&config),
            Err(Error::InvalidComputedField { .. })
        ));
    }

    #[test]
    fn test_structural_errors_come_first() {
        let config = base().with_rule(MappingRule::new("Other", "name"));
        assert!(matches!(
            check_config(&config),
            Err(Error::DuplicateTarget { .. })
        ));
    }

    #[test]
    fn test_unresolved_variables() {
        let config = base()
            .with_computed_field(secondary(
                "live_cpm",
                Formula::expression("prices.live / metrics.expected_plays"),
            ))
            .with_computed_field(secondary(
                "ratio",
                Formula::Legacy {
                    op: LegacyOp::Division,
                    operand1: "metrics.live_cpm".into(),
                    operand2: Some("followers".into()),
                    multiplier: None,
                    precision: None,
                },
            ));

        assert_eq!(
            unresolved_variables(&config),
            vec![
                UnresolvedVariable {
                    field: "live_cpm".into(),
                    variable: "prices.live".into(),
                },
                UnresolvedVariable {
                    field: "ratio".into(),
                    variable: "followers".into(),
                },
            ]
        );
        // Unresolved variables only warn
        assert!(check_config(&config).is_ok());
    }
}
