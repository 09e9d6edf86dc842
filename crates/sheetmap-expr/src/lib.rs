//! # sheetmap-expr
//!
//! A small, safe expression language for computed import fields.
//!
//! This crate provides:
//! - Tokenizing (text → tokens)
//! - Parsing (tokens → AST)
//! - Evaluation (AST + variables → value) with null propagation
//! - A fixed registry of numeric and conditional functions
//! - Configuration-time validation and variable discovery
//!
//! Nothing here performs I/O or holds shared state, so every entry point is
//! safe to call concurrently.
//!
//! ## Example
//!
//! ```rust
//! use sheetmap_expr::{evaluate_expression, Value, Variables};
//!
//! let mut vars = Variables::new();
//! vars.insert("prices.video_60plus".into(), Some(5000.0));
//! vars.insert("metrics.expected_plays".into(), Some(200000.0));
//!
//! let cpm = evaluate_expression(
//!     "round(prices.video_60plus / metrics.expected_plays * 1000, 2)",
//!     &vars,
//! );
//! assert_eq!(cpm, Value::Number(25.0));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod validate;

pub use ast::{BinaryOperator, ComparisonOperator, Expr, UnaryOperator};
pub use error::{ExprError, ExprResult};
pub use evaluator::{evaluate, evaluate_expression, Value, Variables};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse, parse_expression};
pub use validate::{validate_expression, ExpressionCheck};
