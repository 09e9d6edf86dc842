//! Expression Abstract Syntax Tree types

use std::fmt;

/// Expression AST. Built once by the parser and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Dotted variable path
    Variable(String),
    /// Prefix operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Arithmetic operation
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Comparison; never chained
    Comparison {
        op: ComparisonOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call of a registered function (name is lowercase)
    FunctionCall { name: String, args: Vec<Expr> },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
}

impl BinaryOperator {
    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => 2,
            BinaryOperator::Multiply | BinaryOperator::Divide => 3,
        }
    }
}

impl Expr {
    /// Variable paths referenced by the expression, in first-appearance order, without duplicates
    pub fn variables(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables(&self, found: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(path) => {
                if !found.iter().any(|p| p == path) {
                    found.push(path.clone());
                }
            }
            Expr::Unary { operand, .. } => operand.collect_variables(found),
            Expr::Binary { left, right, .. } | Expr::Comparison { left, right, .. } => {
                left.collect_variables(found);
                right.collect_variables(found);
            }
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_variables(found);
                }
            }
        }
    }

    // Comparison 1, add/sub 2, mul/div 3, unary 4, primary 5
    fn precedence(&self) -> u8 {
        match self {
            Expr::Comparison { .. } => 1,
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => 4,
            Expr::Number(n) if n.is_sign_negative() => 4,
            _ => 5,
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

/// Prints the expression back in the DSL, with only the parentheses precedence needs.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) if n.is_sign_negative() => write!(f, "-{}", -n),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(path) => f.write_str(path),
            Expr::Unary { operand, .. } => {
                f.write_str("-")?;
                write_operand(f, operand, operand.precedence() < 4)
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                write_operand(f, left, left.precedence() < prec)?;
                write!(f, " {} ", op)?;
                write_operand(f, right, right.precedence() <= prec)
            }
            Expr::Comparison { op, left, right } => {
                write_operand(f, left, left.precedence() <= 1)?;
                write!(f, " {} ", op)?;
                write_operand(f, right, right.precedence() <= 1)
            }
            Expr::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Negate => f.write_str("-"),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        })
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOperator::Greater => ">",
            ComparisonOperator::Less => "<",
            ComparisonOperator::GreaterEqual => ">=",
            ComparisonOperator::LessEqual => "<=",
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
        })
    }
}
