//! Conditional functions
//!
//! Both tolerate null arguments.

use crate::evaluator::Value;

/// IF(condition, when_true, when_false = 0)
pub fn fn_if(args: &[Value]) -> Value {
    let condition = args.first().is_some_and(Value::is_truthy);
    if condition {
        args.get(1).copied().unwrap_or(Value::Null)
    } else {
        args.get(2).copied().unwrap_or(Value::Number(0.0))
    }
}

/// COALESCE(a, b, ...) - first argument that is neither null nor NaN, else 0
pub fn fn_coalesce(args: &[Value]) -> Value {
    args.iter()
        .copied()
        .find(|value| match value {
            Value::Null => false,
            Value::Number(n) => !n.is_nan(),
            Value::Boolean(_) => true,
        })
        .unwrap_or(Value::Number(0.0))
}
