//! Expression lexer
//!
//! Turns expression text into a flat token stream terminated by [`TokenKind::Eof`].

use std::fmt;

use crate::ast::{BinaryOperator, ComparisonOperator};
use crate::error::{ExprError, ExprResult};

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Integer or decimal literal
    Number(f64),
    /// Dotted identifier used as a variable path
    Identifier(String),
    /// Identifier directly followed by `(`; the parser decides whether it names a function
    Function(String),
    /// `+ - * /`
    Operator(BinaryOperator),
    /// `> < >= <= == !=`
    Comparison(ComparisonOperator),
    LParen,
    RParen,
    Comma,
    /// End of input
    Eof,
}

/// A token and the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Identifier(s) | TokenKind::Function(s) => f.write_str(s),
            TokenKind::Operator(op) => write!(f, "{}", op),
            TokenKind::Comparison(op) => write!(f, "{}", op),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// Tokenize an expression.
///
/// Whitespace is skipped. Any character outside the language is an error; nothing
/// is silently dropped.
///
/// # Example
/// ```rust
/// use sheetmap_expr::lexer::{tokenize, TokenKind};
///
/// let tokens = tokenize("prices.video / 2").unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Identifier("prices.video".into()));
/// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
/// ```
pub fn tokenize(input: &str) -> ExprResult<Vec<Token>> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.scan_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn scan_token(&mut self) -> ExprResult<Token> {
        self.skip_whitespace();

        let offset = self.pos;
        let Some(c) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset,
            });
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(TokenKind::Operator(BinaryOperator::Add)),
            '-' => Some(TokenKind::Operator(BinaryOperator::Subtract)),
            '*' => Some(TokenKind::Operator(BinaryOperator::Multiply)),
            '/' => Some(TokenKind::Operator(BinaryOperator::Divide)),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Ok(Token { kind, offset });
        }

        // Comparison operators, greedily taking a following '='
        if matches!(c, '>' | '<' | '=' | '!') {
            self.advance();
            let followed_by_eq = self.peek_char() == Some('=');
            if followed_by_eq {
                self.advance();
            }
            let op = match (c, followed_by_eq) {
                ('>', false) => ComparisonOperator::Greater,
                ('>', true) => ComparisonOperator::GreaterEqual,
                ('<', false) => ComparisonOperator::Less,
                ('<', true) => ComparisonOperator::LessEqual,
                ('=', _) => ComparisonOperator::Equal,
                ('!', true) => ComparisonOperator::NotEqual,
                _ => return Err(ExprError::Lex { ch: c, offset }),
            };
            return Ok(Token {
                kind: TokenKind::Comparison(op),
                offset,
            });
        }

        // Number
        if c.is_ascii_digit() || (c == '.' && self.peek_char_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            return self.scan_number(offset);
        }

        // Identifier or function name
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.scan_identifier(offset));
        }

        Err(ExprError::Lex { ch: c, offset })
    }

    fn scan_number(&mut self, offset: usize) -> ExprResult<Token> {
        // Integer part
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.input[offset..self.pos];
        let value: f64 = text
            .parse()
            .map_err(|_| ExprError::Parse(format!("Invalid number literal '{}'", text)))?;
        Ok(Token {
            kind: TokenKind::Number(value),
            offset,
        })
    }

    fn scan_identifier(&mut self, offset: usize) -> Token {
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }
        let text = self.input[offset..self.pos].to_string();

        // Lookahead past whitespace for a call
        let rest = self.input[self.pos..].trim_start();
        let kind = if rest.starts_with('(') {
            TokenKind::Function(text)
        } else {
            TokenKind::Identifier(text)
        };
        Token { kind, offset }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.14 .5"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.14),
                TokenKind::Number(0.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dotted_identifiers_and_functions() {
        assert_eq!(
            kinds("round(prices.video_60plus, 2)"),
            vec![
                TokenKind::Function("round".into()),
                TokenKind::LParen,
                TokenKind::Identifier("prices.video_60plus".into()),
                TokenKind::Comma,
                TokenKind::Number(2.0),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("max (a)")[0], TokenKind::Function("max".into()));
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("a >= b <= c == d != e > f < g"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Comparison(ComparisonOperator::GreaterEqual),
                TokenKind::Identifier("b".into()),
                TokenKind::Comparison(ComparisonOperator::LessEqual),
                TokenKind::Identifier("c".into()),
                TokenKind::Comparison(ComparisonOperator::Equal),
                TokenKind::Identifier("d".into()),
                TokenKind::Comparison(ComparisonOperator::NotEqual),
                TokenKind::Identifier("e".into()),
                TokenKind::Comparison(ComparisonOperator::Greater),
                TokenKind::Identifier("f".into()),
                TokenKind::Comparison(ComparisonOperator::Less),
                TokenKind::Identifier("g".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("a  +  10").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 3, 6, 8]);
    }

    #[test]
    fn test_unknown_character_is_an_error() {
        assert_eq!(tokenize("a # b"), Err(ExprError::Lex { ch: '#', offset: 2 }));
        assert_eq!(tokenize("a ^ 2"), Err(ExprError::Lex { ch: '^', offset: 2 }));
        assert_eq!(tokenize("!a"), Err(ExprError::Lex { ch: '!', offset: 0 }));
    }

    #[test]
    fn test_offset_counts_bytes() {
        assert_eq!(tokenize("价 + 1"), Err(ExprError::Lex { ch: '价', offset: 0 }));
        assert_eq!(tokenize("1 + 价"), Err(ExprError::Lex { ch: '价', offset: 4 }));
    }

    proptest::proptest! {
        #[test]
        fn lex_errors_point_at_the_offending_char(input in "\\PC{0,24}") {
            match tokenize(&input) {
                Ok(tokens) => {
                    proptest::prop_assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
                }
                Err(ExprError::Lex { ch, offset }) => {
                    proptest::prop_assert_eq!(input[offset..].chars().next(), Some(ch));
                }
                Err(other) => proptest::prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
