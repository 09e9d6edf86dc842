//! Expression evaluator
//!
//! Walks an AST against a flat variable map. Missing data is represented by
//! [`Value::Null`] and propagates through arithmetic; comparisons against null
//! are simply false.

use std::collections::HashMap;

use crate::ast::{BinaryOperator, ComparisonOperator, Expr, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use crate::functions;
use crate::parser::parse_expression;

/// Variable values keyed by dotted path; `None` marks a known-missing value
pub type Variables = HashMap<String, Option<f64>>;

/// Value types during evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Null,
}

impl Value {
    /// Numeric view; booleans count as 1 and 0
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(true) => Some(1.0),
            Value::Boolean(false) => Some(0.0),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Condition semantics for `if`: null, zero, NaN and false are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
            Value::Null => false,
        }
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Value::Null, Value::Number)
    }
}

/// Evaluate an expression AST
pub fn evaluate(expr: &Expr, variables: &Variables) -> ExprResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),

        Expr::Variable(path) => Ok(variables.get(path).copied().flatten().into()),

        Expr::Unary { op, operand } => {
            let value = evaluate(operand, variables)?;
            Ok(match (op, value.as_number()) {
                (UnaryOperator::Negate, Some(n)) => Value::Number(-n),
                (UnaryOperator::Negate, None) => Value::Null,
            })
        }

        Expr::Binary { op, left, right } => evaluate_binary_op(*op, left, right, variables),

        Expr::Comparison { op, left, right } => {
            let left_val = evaluate(left, variables)?;
            let right_val = evaluate(right, variables)?;
            let (Some(l), Some(r)) = (left_val.as_number(), right_val.as_number()) else {
                return Ok(Value::Boolean(false));
            };
            Ok(Value::Boolean(match op {
                ComparisonOperator::Greater => l > r,
                ComparisonOperator::Less => l < r,
                ComparisonOperator::GreaterEqual => l >= r,
                ComparisonOperator::LessEqual => l <= r,
                ComparisonOperator::Equal => l == r,
                ComparisonOperator::NotEqual => l != r,
            }))
        }

        Expr::FunctionCall { name, args } => evaluate_function(name, args, variables),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &Expr,
    right: &Expr,
    variables: &Variables,
) -> ExprResult<Value> {
    // Evaluate operands first
    let left_val = evaluate(left, variables)?;
    let right_val = evaluate(right, variables)?;

    // Propagate nulls
    let (Some(l), Some(r)) = (left_val.as_number(), right_val.as_number()) else {
        return Ok(Value::Null);
    };

    Ok(match op {
        BinaryOperator::Add => Value::Number(l + r),
        BinaryOperator::Subtract => Value::Number(l - r),
        BinaryOperator::Multiply => Value::Number(l * r),
        BinaryOperator::Divide if r == 0.0 => Value::Null,
        BinaryOperator::Divide => Value::Number(l / r),
    })
}

fn evaluate_function(name: &str, args: &[Expr], variables: &Variables) -> ExprResult<Value> {
    let func =
        functions::lookup(name).ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if !func.accepts(args.len()) {
        return Err(ExprError::ArgumentCount {
            function: func.name.to_string(),
            expected: func.arity(),
            actual: args.len(),
        });
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, variables)?);
    }

    if func.propagates_null && evaluated_args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }

    // Call the function
    Ok((func.implementation)(&evaluated_args))
}

/// Lex, parse and evaluate in one step.
///
/// Never fails: any lex, parse or evaluation error is logged and yields
/// [`Value::Null`], so one malformed formula cannot abort a batch.
///
/// # Example
/// ```rust
/// use sheetmap_expr::{evaluate_expression, Value, Variables};
///
/// let mut vars = Variables::new();
/// vars.insert("x".into(), Some(-5.0));
/// assert_eq!(evaluate_expression("if(x > 0, x, 0)", &vars), Value::Number(0.0));
/// assert_eq!(evaluate_expression("10 / 0", &vars), Value::Null);
/// assert_eq!(evaluate_expression("10 +", &vars), Value::Null);
/// ```
pub fn evaluate_expression(expression: &str, variables: &Variables) -> Value {
    match parse_expression(expression).and_then(|ast| evaluate(&ast, variables)) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(expression, %error, "expression evaluation failed");
            Value::Null
        }
    }
}
