//! Configuration-time expression checks

use serde::Serialize;

use crate::parser::parse_expression;

/// Outcome of [`validate_expression`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressionCheck {
    pub valid: bool,
    /// Referenced variable paths, in first-appearance order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lex and parse an expression without evaluating it, collecting the variables it uses.
///
/// # Example
/// ```rust
/// use sheetmap_expr::validate_expression;
///
/// let check = validate_expression("a.b + c");
/// assert!(check.valid);
/// assert_eq!(check.variables, vec!["a.b", "c"]);
/// ```
pub fn validate_expression(expression: &str) -> ExpressionCheck {
    match parse_expression(expression) {
        Ok(ast) => ExpressionCheck {
            valid: true,
            variables: ast.variables(),
            error: None,
        },
        Err(error) => ExpressionCheck {
            valid: false,
            variables: Vec::new(),
            error: Some(error.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_valid_expression() {
        let check = validate_expression("a.b + c");
        assert_eq!(
            check,
            ExpressionCheck {
                valid: true,
                variables: vec!["a.b".into(), "c".into()],
                error: None,
            }
        );
    }

    #[test]
    fn test_variables_are_deduplicated_and_skip_functions() {
        let check = validate_expression(
            "if(metrics.expected_plays > 0, round(prices.video / metrics.expected_plays, 2), 0)",
        );
        assert_eq!(check.variables, vec!["metrics.expected_plays", "prices.video"]);
    }

    #[test]
    fn test_invalid_expression() {
        let check = validate_expression("a + * b");
        assert!(!check.valid);
        assert!(check.variables.is_empty());
        assert!(check.error.unwrap().starts_with("Parse error"));

        let check = validate_expression("a @ b");
        assert_eq!(
            check.error.as_deref(),
            Some("Unexpected character '@' at offset 2")
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(validate_expression("x * 2")).unwrap();
        assert_eq!(json, serde_json::json!({"valid": true, "variables": ["x"]}));

        let json = serde_json::to_value(validate_expression("x *")).unwrap();
        assert_eq!(json["valid"], serde_json::json!(false));
        assert!(json["error"].is_string());
    }
}
