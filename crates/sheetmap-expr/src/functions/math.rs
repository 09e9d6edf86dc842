//! Numeric functions
//!
//! Null arguments never reach these: the evaluator short-circuits them.

use crate::evaluator::Value;

fn number(args: &[Value], index: usize) -> Option<f64> {
    args.get(index).and_then(Value::as_number)
}

fn unary(args: &[Value], f: impl Fn(f64) -> f64) -> Value {
    match number(args, 0) {
        Some(n) => Value::Number(f(n)),
        None => Value::Null,
    }
}

/// Round half away from zero to `digits` decimal places
pub fn round_to(value: f64, digits: i32) -> f64 {
    let multiplier = 10_f64.powi(digits);
    (value * multiplier).round() / multiplier
}

/// MIN(a, b, ...)
pub fn fn_min(args: &[Value]) -> Value {
    args.iter()
        .filter_map(Value::as_number)
        .reduce(f64::min)
        .map_or(Value::Null, Value::Number)
}

/// MAX(a, b, ...)
pub fn fn_max(args: &[Value]) -> Value {
    args.iter()
        .filter_map(Value::as_number)
        .reduce(f64::max)
        .map_or(Value::Null, Value::Number)
}

/// ABS(x)
pub fn fn_abs(args: &[Value]) -> Value {
    unary(args, f64::abs)
}

/// ROUND(x, decimals = 0)
pub fn fn_round(args: &[Value]) -> Value {
    let digits = number(args, 1).unwrap_or(0.0) as i32;
    unary(args, |n| round_to(n, digits))
}

/// FLOOR(x)
pub fn fn_floor(args: &[Value]) -> Value {
    unary(args, f64::floor)
}

/// CEIL(x)
pub fn fn_ceil(args: &[Value]) -> Value {
    unary(args, f64::ceil)
}

/// SQRT(x); negative input gives NaN
pub fn fn_sqrt(args: &[Value]) -> Value {
    unary(args, f64::sqrt)
}

/// POW(base, exponent = 2)
pub fn fn_pow(args: &[Value]) -> Value {
    let exponent = number(args, 1).unwrap_or(2.0);
    unary(args, |base| base.powf(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::Number).collect()
    }

    #[test]
    fn test_min_max() {
        assert_eq!(fn_min(&nums(&[3.0, -1.0, 2.0])), Value::Number(-1.0));
        assert_eq!(fn_max(&nums(&[3.0, -1.0, 2.0])), Value::Number(3.0));
        assert_eq!(fn_max(&nums(&[7.0])), Value::Number(7.0));
    }

    #[test]
    fn test_round() {
        assert_eq!(fn_round(&nums(&[3.14159, 2.0])), Value::Number(3.14));
        assert_eq!(fn_round(&nums(&[2.5])), Value::Number(3.0));
        assert_eq!(fn_round(&nums(&[-2.5])), Value::Number(-3.0));
        assert_eq!(fn_round(&nums(&[1234.0, -2.0])), Value::Number(1200.0));
    }

    #[test]
    fn test_round_just_below_half() {
        assert_eq!(round_to(0.49999999999999994, 0), 0.0);
        assert_eq!(round_to(-0.49999999999999994, 0), 0.0);
        assert_eq!(round_to(0.5, 0), 1.0);
    }

    #[test]
    fn test_pow_default_exponent() {
        assert_eq!(fn_pow(&nums(&[3.0])), Value::Number(9.0));
        assert_eq!(fn_pow(&nums(&[2.0, 10.0])), Value::Number(1024.0));
    }

    #[test]
    fn test_unary_functions() {
        assert_eq!(fn_abs(&nums(&[-4.0])), Value::Number(4.0));
        assert_eq!(fn_floor(&nums(&[4.7])), Value::Number(4.0));
        assert_eq!(fn_ceil(&nums(&[4.2])), Value::Number(5.0));
        assert_eq!(fn_sqrt(&nums(&[16.0])), Value::Number(4.0));
        assert!(matches!(fn_sqrt(&nums(&[-1.0])), Value::Number(n) if n.is_nan()));
    }
}
