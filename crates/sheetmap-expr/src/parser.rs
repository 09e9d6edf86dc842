//! Expression parser
//!
//! A recursive descent parser with one token of lookahead.
//!
//! ```text
//! expression  := addsub ( comparisonOp addsub )?
//! addsub      := muldiv ( ('+'|'-') muldiv )*
//! muldiv      := unary ( ('*'|'/') unary )*
//! unary       := '-' unary | primary
//! primary     := NUMBER | IDENT | FUNCNAME '(' (expression (',' expression)*)? ')' | '(' expression ')'
//! ```

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use crate::functions;
use crate::lexer::{tokenize, Token, TokenKind};

static EOF: TokenKind = TokenKind::Eof;

/// Parse expression text into an AST
///
/// # Example
/// ```rust
/// use sheetmap_expr::parse_expression;
///
/// let ast = parse_expression("prices.video_60plus / metrics.expected_plays * 1000").unwrap();
/// let ast = parse_expression("if(metrics.expected_plays > 0, 1, 0)").unwrap();
/// ```
pub fn parse_expression(input: &str) -> ExprResult<Expr> {
    let tokens = tokenize(input)?;
    parse(&tokens)
}

/// Parse a token stream into an AST.
///
/// Fails on trailing tokens, a missing expected token, or an unexpected leading token.
pub fn parse(tokens: &[Token]) -> ExprResult<Expr> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current(), TokenKind::Eof) {
        return Err(ExprError::Parse(format!(
            "Unexpected '{}' at offset {} after expression",
            parser.current(),
            parser.offset()
        )));
    }

    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    // === Helper methods ===

    fn current(&self) -> &'t TokenKind {
        self.tokens.get(self.pos).map_or(&EOF, |t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or(0, |t| t.offset)
    }

    fn consume(&mut self) -> &'t TokenKind {
        let kind = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn expect(&mut self, expected: &TokenKind) -> ExprResult<()> {
        if self.current() == expected {
            self.consume();
            Ok(())
        } else {
            Err(ExprError::Parse(format!(
                "Expected '{}' at offset {}, got '{}'",
                expected,
                self.offset(),
                self.current()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: > < >= <= == != (at most one)
    // 2. Addition/Subtraction: +, -
    // 3. Multiplication/Division: *, /
    // 4. Unary: -
    // 5. Primary: numbers, variables, function calls, parentheses

    fn parse_expression(&mut self) -> ExprResult<Expr> {
        let left = self.parse_additive()?;

        if let TokenKind::Comparison(op) = self.current() {
            self.consume();
            let right = self.parse_additive()?;
            return Ok(Expr::Comparison {
                op: *op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        while let TokenKind::Operator(op @ (BinaryOperator::Add | BinaryOperator::Subtract)) =
            self.current()
        {
            self.consume();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op: *op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_unary()?;

        while let TokenKind::Operator(op @ (BinaryOperator::Multiply | BinaryOperator::Divide)) =
            self.current()
        {
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op: *op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        if matches!(self.current(), TokenKind::Operator(BinaryOperator::Subtract)) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ExprResult<Expr> {
        let offset = self.offset();
        match self.current() {
            TokenKind::Number(n) => {
                self.consume();
                Ok(Expr::Number(*n))
            }

            TokenKind::Identifier(path) => {
                self.consume();
                Ok(Expr::Variable(path.clone()))
            }

            TokenKind::Function(name) => {
                self.consume();
                self.parse_function_call(name, offset)
            }

            TokenKind::LParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }

            other => Err(ExprError::Parse(format!(
                "Unexpected '{}' at offset {}",
                other, offset
            ))),
        }
    }

    fn parse_function_call(&mut self, name: &str, offset: usize) -> ExprResult<Expr> {
        let def = functions::lookup(name).ok_or_else(|| {
            ExprError::UnknownFunction(format!("{} (at offset {})", name, offset))
        })?;

        self.expect(&TokenKind::LParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current(), TokenKind::RParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current(), TokenKind::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&TokenKind::RParen)?;

        if !def.accepts(args.len()) {
            return Err(ExprError::ArgumentCount {
                function: def.name.to_string(),
                expected: def.arity(),
                actual: args.len(),
            });
        }

        Ok(Expr::FunctionCall {
            name: def.name.to_string(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ComparisonOperator;
    use pretty_assertions::assert_eq;

    fn var(path: &str) -> Box<Expr> {
        Box::new(Expr::Variable(path.into()))
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn test_parse_number_and_variable() {
        assert_eq!(parse_expression("42").unwrap(), Expr::Number(42.0));
        assert_eq!(
            parse_expression("metrics.expected_plays").unwrap(),
            Expr::Variable("metrics.expected_plays".into())
        );
    }

    #[test]
    fn test_parse_precedence() {
        // Should parse as 1+(2*3) due to precedence
        assert_eq!(
            parse_expression("1 + 2 * 3").unwrap(),
            Expr::Binary {
                op: BinaryOperator::Add,
                left: num(1.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOperator::Multiply,
                    left: num(2.0),
                    right: num(3.0),
                }),
            }
        );
    }

    #[test]
    fn test_parse_left_associative() {
        // (a / b) * 1000
        assert_eq!(
            parse_expression("a / b * 1000").unwrap(),
            Expr::Binary {
                op: BinaryOperator::Multiply,
                left: Box::new(Expr::Binary {
                    op: BinaryOperator::Divide,
                    left: var("a"),
                    right: var("b"),
                }),
                right: num(1000.0),
            }
        );
    }

    #[test]
    fn test_parse_parentheses() {
        let ast = parse_expression("(1 + 2) * 3").unwrap();
        assert!(matches!(
            ast,
            Expr::Binary {
                op: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_expression("--x").unwrap(),
            Expr::Unary {
                op: UnaryOperator::Negate,
                operand: Box::new(Expr::Unary {
                    op: UnaryOperator::Negate,
                    operand: var("x"),
                }),
            }
        );
        assert!(parse_expression("+x").is_err());
    }

    #[test]
    fn test_parse_comparison() {
        assert_eq!(
            parse_expression("a + 1 >= b").unwrap(),
            Expr::Comparison {
                op: ComparisonOperator::GreaterEqual,
                left: Box::new(Expr::Binary {
                    op: BinaryOperator::Add,
                    left: var("a"),
                    right: num(1.0),
                }),
                right: var("b"),
            }
        );
    }

    #[test]
    fn test_comparisons_do_not_chain() {
        assert!(matches!(
            parse_expression("a > b > c"),
            Err(ExprError::Parse(_))
        ));
        assert!(parse_expression("(a > b) > c").is_ok());
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_expression("ROUND(x, 2)").unwrap();
        assert_eq!(
            ast,
            Expr::FunctionCall {
                name: "round".into(),
                args: vec![Expr::Variable("x".into()), Expr::Number(2.0)],
            }
        );

        let ast = parse_expression("if(a > 0, max(a, b, c), 0)").unwrap();
        if let Expr::FunctionCall { name, args } = ast {
            assert_eq!(name, "if");
            assert_eq!(args.len(), 3);
            assert!(matches!(&args[1], Expr::FunctionCall { name, args } if name == "max" && args.len() == 3));
        } else {
            panic!("Expected FunctionCall");
        }
    }

    #[test]
    fn test_function_name_without_call_is_variable() {
        assert_eq!(
            parse_expression("round + 1").unwrap(),
            Expr::Binary {
                op: BinaryOperator::Add,
                left: var("round"),
                right: num(1.0),
            }
        );
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            parse_expression("sum(a, b)"),
            Err(ExprError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_argument_count() {
        assert_eq!(
            parse_expression("abs(1, 2)"),
            Err(ExprError::ArgumentCount {
                function: "abs".into(),
                expected: "1".into(),
                actual: 2,
            })
        );
        assert!(parse_expression("if(a)").is_err());
        assert!(parse_expression("max()").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_expression(""), Err(ExprError::Parse(_))));
        assert!(matches!(parse_expression("(1 + 2"), Err(ExprError::Parse(_))));
        assert!(matches!(parse_expression("1 2"), Err(ExprError::Parse(_))));
        assert!(matches!(parse_expression("* 2"), Err(ExprError::Parse(_))));
        assert!(matches!(parse_expression("max(1,)"), Err(ExprError::Parse(_))));
        assert!(matches!(parse_expression("a ? b"), Err(ExprError::Lex { .. })));
    }

    #[test]
    fn test_parse_without_eof_token() {
        let mut tokens = tokenize("1 + 2").unwrap();
        tokens.pop();
        assert!(parse(&tokens).is_ok());
    }

    #[test]
    fn test_display_roundtrip() {
        for text in [
            "prices.video_60plus / metrics.expected_plays * 1000",
            "(prices.video_60plus * 0.6 + prices.video_21_60 * 0.4) / metrics.expected_plays * 1000",
            "if(metrics.expected_plays > 0, prices.video_60plus / metrics.expected_plays * 1000, 0)",
            "round(prices.video_60plus / metrics.expected_plays * 1000, 2)",
            "a - (b - c)",
            "-(a + b) * -c",
            "(a > b) == (c < d)",
        ] {
            let ast = parse_expression(text).unwrap();
            let printed = ast.to_string();
            assert_eq!(parse_expression(&printed).unwrap(), ast, "{}", printed);
        }
        assert_eq!(
            parse_expression("(a*b)+c").unwrap().to_string(),
            "a * b + c"
        );
    }
}
