//! Computed fields: expression and legacy two-operand formulas

use lazy_regex::regex;
use sheetmap_core::{ComputedFieldConfig, Document, Formula, LegacyOp};
use sheetmap_expr::functions::{is_function_name, math::round_to};
use sheetmap_expr::{evaluate, evaluate_expression, parse_expression, Expr, Value};

use crate::resolver::{resolve, resolve_all};

/// Candidate variable names in an expression.
///
/// A lexical scan: identifiers that are not registered function names,
/// deduplicated in order of first appearance.
pub fn extract_variable_names(expression: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for found in regex!(r"\b[A-Za-z_][A-Za-z0-9_.]*").find_iter(expression) {
        let name = found.as_str().trim_end_matches('.');
        if name.is_empty() || is_function_name(name) {
            continue;
        }
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Finite numeric result of an evaluation; booleans become 1 or 0
fn to_number(value: Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(n),
        Value::Boolean(b) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn apply_precision(value: f64, precision: Option<u32>) -> f64 {
    match precision {
        Some(digits) => round_to(value, digits as i32),
        None => value,
    }
}

fn compute_legacy(
    primary: &Document,
    secondary: &Document,
    op: LegacyOp,
    operand1: &str,
    operand2: Option<&str>,
    multiplier: Option<f64>,
) -> Option<f64> {
    let left = resolve(primary, secondary, operand1)?;
    let right = operand2.and_then(|path| resolve(primary, secondary, path));

    let raw = match op {
        LegacyOp::Division => {
            let divisor = right.filter(|d| *d != 0.0)?;
            left / divisor
        }
        LegacyOp::Multiplication => left * right.unwrap_or(0.0),
        LegacyOp::Addition => left + right.unwrap_or(0.0),
        LegacyOp::Subtraction => left - right.unwrap_or(0.0),
    };
    Some(raw * multiplier.unwrap_or(1.0)).filter(|n| n.is_finite())
}

/// Compute one field for one row. `None` means the field is omitted.
pub fn compute_field(
    primary: &Document,
    secondary: &Document,
    config: &ComputedFieldConfig,
) -> Option<f64> {
    let value = match &config.formula {
        Formula::Expression { expression, .. } => {
            let names = extract_variable_names(expression);
            let variables = resolve_all(primary, secondary, &names);
            to_number(evaluate_expression(expression, &variables))
        }
        Formula::Legacy {
            op,
            operand1,
            operand2,
            multiplier,
            ..
        } => compute_legacy(
            primary,
            secondary,
            *op,
            operand1,
            operand2.as_deref(),
            *multiplier,
        ),
    }?;
    Some(apply_precision(value, config.formula.precision()))
}

#[derive(Debug, Clone)]
enum Program {
    Expression { ast: Expr, variables: Vec<String> },
    /// The expression did not parse; every row yields nothing
    Invalid,
    Legacy,
}

/// A computed field prepared once per import job.
///
/// Expressions are parsed up front so each row only resolves variables and
/// evaluates. Results match [`compute_field`].
#[derive(Debug, Clone)]
pub struct CompiledField {
    config: ComputedFieldConfig,
    program: Program,
}

impl CompiledField {
    pub fn compile(config: &ComputedFieldConfig) -> Self {
        let program = match &config.formula {
            Formula::Expression { expression, .. } => match parse_expression(expression) {
                Ok(ast) => Program::Expression {
                    variables: extract_variable_names(expression),
                    ast,
                },
                Err(error) => {
                    tracing::warn!(
                        field = %config.name,
                        expression = %expression,
                        %error,
                        "computed field expression does not parse"
                    );
                    Program::Invalid
                }
            },
            Formula::Legacy { .. } => Program::Legacy,
        };
        Self {
            config: config.clone(),
            program,
        }
    }

    pub fn config(&self) -> &ComputedFieldConfig {
        &self.config
    }

    /// Evaluate against one row's documents
    pub fn evaluate(&self, primary: &Document, secondary: &Document) -> Option<f64> {
        let value = match &self.program {
            Program::Expression { ast, variables } => {
                let vars = resolve_all(primary, secondary, variables);
                match evaluate(ast, &vars) {
                    Ok(value) => to_number(value),
                    Err(error) => {
                        tracing::warn!(field = %self.config.name, %error, "computed field evaluation failed");
                        None
                    }
                }
            }
            Program::Invalid => None,
            Program::Legacy => return compute_field(primary, secondary, &self.config),
        }?;
        Some(apply_precision(value, self.config.formula.precision()))
    }
}
