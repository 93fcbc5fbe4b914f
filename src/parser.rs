//! Parser for the textual LTL syntax.
//!
//! ```text
//! expr    := unary (BINARY expr)?
//! unary   := UNARY unary | primary
//! primary := PREDICATE | '(' expr ')'
//!
//! UNARY     := not | next | finally | globally
//! BINARY    := and | or | until | release
//! PREDICATE := [_A-Za-z][_0-9A-Za-z]* | "..." (backslash escapes)
//! ```
//!
//! All binary operators share one precedence level and associate to the
//! right, so `a and b until c` reads as `a and (b until c)`.
//!
//! ```
//! use ltl_rs::formula::Ltl;
//! use ltl_rs::parser::parse;
//!
//! let ltl = Ltl::default();
//! let f = parse(&ltl, "not (globally finally green)").unwrap();
//! let green = ltl.mk_atom("green");
//! assert_eq!(f, ltl.mk_finally(ltl.mk_globally(ltl.mk_not(green))));
//! ```

use std::fmt::{Display, Formatter};

use log::debug;
use logos::{Lexer, Logos};

use crate::formula::{BinaryOp, Formula, Ltl, UnaryOp};

#[derive(Logos, Debug, Clone, Eq, PartialEq)]
#[logos(skip r"\s+")]
pub enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("not", |_| UnaryOp::Not)]
    #[token("next", |_| UnaryOp::Next)]
    #[token("finally", |_| UnaryOp::Finally)]
    #[token("globally", |_| UnaryOp::Globally)]
    Unary(UnaryOp),
    #[token("and", |_| BinaryOp::And)]
    #[token("or", |_| BinaryOp::Or)]
    #[token("until", |_| BinaryOp::Until)]
    #[token("release", |_| BinaryOp::Release)]
    Binary(BinaryOp),
    #[regex(r"[_A-Za-z][_0-9A-Za-z]*", |lex| lex.slice().to_string())]
    #[regex(r#""([^"\\]|\\.)*""#, unquote)]
    Predicate(String),
    /// Text no other token matches.
    Invalid(String),
    End,
}

/// Contents of a quoted predicate with escapes resolved.
fn unquote(lex: &mut Lexer<'_, Token>) -> String {
    let slice = lex.slice();
    let mut value = String::new();
    let mut chars = slice[1..slice.len() - 1].chars();
    while let Some(c) = chars.next() {
        let c = match c {
            '\\' => match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some(other) => other,
                None => break,
            },
            c => c,
        };
        value.push(c);
    }
    value
}

/// Next token of `lexer` and its byte offset; [`Token::End`] once the input is exhausted.
fn next_token(lexer: &mut Lexer<'_, Token>) -> (Token, usize) {
    match lexer.next() {
        None => (Token::End, lexer.source().len()),
        Some(Ok(token)) => (token, lexer.span().start),
        Some(Err(())) => (Token::Invalid(lexer.slice().to_string()), lexer.span().start),
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Unary(op) => write!(f, "{}", unary_keyword(*op)),
            Token::Binary(op) => write!(f, "{}", binary_keyword(*op)),
            Token::Predicate(name) => write!(f, "PREDICATE {:?}", name),
            Token::Invalid(text) => write!(f, "INVALID {:?}", text),
            Token::End => write!(f, "end of input"),
        }
    }
}

const UNARY: [(&str, UnaryOp); 4] = [
    ("not", UnaryOp::Not),
    ("next", UnaryOp::Next),
    ("finally", UnaryOp::Finally),
    ("globally", UnaryOp::Globally),
];

const BINARY: [(&str, BinaryOp); 4] = [
    ("and", BinaryOp::And),
    ("or", BinaryOp::Or),
    ("until", BinaryOp::Until),
    ("release", BinaryOp::Release),
];

fn unary_keyword(op: UnaryOp) -> &'static str {
    UNARY.iter().find(|(_, o)| *o == op).map_or("?", |(k, _)| k)
}

fn binary_keyword(op: BinaryOp) -> &'static str {
    BINARY.iter().find(|(_, o)| *o == op).map_or("?", |(k, _)| k)
}

/// Whether `word` is an operator keyword (and thus cannot be a bare predicate).
pub fn is_keyword(word: &str) -> bool {
    UNARY.iter().any(|(k, _)| *k == word) || BINARY.iter().any(|(k, _)| *k == word)
}

/// Error produced for malformed input. Parsing stops at the first error.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseError {
    /// Byte offset of the offending token.
    pub position: usize,
    /// Tokens that would have been accepted.
    pub expected: Vec<&'static str>,
    /// The token actually found.
    pub found: Token,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unexpected {} at offset {} (expect {})",
            self.found,
            self.position,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for ParseError {}

/// LL(1) parser building canonical formulas in an [`Ltl`] manager.
pub struct Parser<'a> {
    ltl: &'a Ltl,
    lexer: Lexer<'a, Token>,
    token: Token,
    position: usize,
}

const EXPECT_UNARY: &[&str] = &["not", "next", "finally", "globally", "PREDICATE", "'('"];
const EXPECT_AFTER_EXPR: &[&str] = &["and", "or", "until", "release", "')'"];

impl<'a> Parser<'a> {
    pub fn new(ltl: &'a Ltl, src: &'a str) -> Self {
        let mut lexer = Token::lexer(src);
        let (token, position) = next_token(&mut lexer);
        Self {
            ltl,
            lexer,
            token,
            position,
        }
    }

    fn advance(&mut self) -> Token {
        let (token, position) = next_token(&mut self.lexer);
        self.position = position;
        std::mem::replace(&mut self.token, token)
    }

    fn error(&self, expected: &[&'static str]) -> ParseError {
        ParseError {
            position: self.position,
            expected: expected.to_vec(),
            found: self.token.clone(),
        }
    }

    /// Parse the whole input as a single formula.
    pub fn parse(mut self) -> Result<Formula, ParseError> {
        let f = self.expr()?;
        if self.token != Token::End {
            let mut expected = EXPECT_AFTER_EXPR[..4].to_vec();
            expected.push("end of input");
            return Err(self.error(&expected));
        }
        Ok(f)
    }

    fn expr(&mut self) -> Result<Formula, ParseError> {
        let lhs = self.unary()?;
        if let Token::Binary(op) = self.token {
            self.advance();
            let rhs = self.expr()?;
            return Ok(self.ltl.mk_binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Formula, ParseError> {
        match self.token {
            Token::Unary(op) => {
                self.advance();
                let f = self.unary()?;
                Ok(self.ltl.mk_unary(op, f))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Formula, ParseError> {
        match self.token.clone() {
            Token::Predicate(name) => {
                self.advance();
                Ok(self.ltl.mk_atom(&name))
            }
            Token::LParen => {
                self.advance();
                let f = self.expr()?;
                if self.token != Token::RParen {
                    return Err(self.error(EXPECT_AFTER_EXPR));
                }
                self.advance();
                Ok(f)
            }
            _ => Err(self.error(EXPECT_UNARY)),
        }
    }
}

/// Parse `src` into a formula.
pub fn parse(ltl: &Ltl, src: &str) -> Result<Formula, ParseError> {
    let result = Parser::new(ltl, src).parse();
    debug!("parse({:?}) = {:?}", src, result);
    result
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        Token::lexer(src).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_tokenizer() {
        assert_eq!(
            tokens("not (a until\t\"b c\")"),
            vec![
                Token::Unary(UnaryOp::Not),
                Token::LParen,
                Token::Predicate("a".to_string()),
                Token::Binary(BinaryOp::Until),
                Token::Predicate("b c".to_string()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_keywords_match_whole_words() {
        assert_eq!(tokens("nothing"), vec![Token::Predicate("nothing".to_string())]);
        assert_eq!(tokens("or_else"), vec![Token::Predicate("or_else".to_string())]);
    }

    #[test]
    fn test_quoted_escapes() {
        assert_eq!(tokens(r#""a\"b\\c""#), vec![Token::Predicate("a\"b\\c".to_string())]);
        assert_eq!(Token::lexer("\"open").next(), Some(Err(())));

        let ltl = Ltl::default();
        let err = parse(&ltl, "globally \"open").unwrap_err();
        assert!(matches!(err.found, Token::Invalid(_)));
        assert_eq!(err.position, 9);
    }

    #[test]
    fn test_parse_stoplight_property() {
        let ltl = Ltl::default();
        let f = parse(&ltl, "not (globally finally green)").unwrap();
        let green = ltl.mk_atom("green");
        let expected = ltl.mk_not(ltl.mk_globally(ltl.mk_finally(green)));
        assert_eq!(f, expected);
    }

    #[test]
    fn test_binary_is_right_associative() {
        let ltl = Ltl::default();
        let f = parse(&ltl, "a and b until c").unwrap();
        let (a, b, c) = (ltl.mk_atom("a"), ltl.mk_atom("b"), ltl.mk_atom("c"));
        assert_eq!(f, ltl.mk_and(a, ltl.mk_until(b, c)));

        let g = parse(&ltl, "(a and b) until c").unwrap();
        assert_eq!(g, ltl.mk_until(ltl.mk_and(a, b), c));
    }

    #[test]
    fn test_unary_binds_tighter() {
        let ltl = Ltl::default();
        let f = parse(&ltl, "next a or b").unwrap();
        let (a, b) = (ltl.mk_atom("a"), ltl.mk_atom("b"));
        assert_eq!(f, ltl.mk_or(ltl.mk_next(a), b));
    }

    #[test]
    fn test_display_round_trip() {
        let ltl = Ltl::default();
        let f = parse(&ltl, "globally (req release \"x > 1\") or next not ack").unwrap();
        assert_eq!(parse(&ltl, &ltl.display(f)).unwrap(), f);
    }

    #[test]
    fn test_errors() {
        let ltl = Ltl::default();

        let err = parse(&ltl, "a and").unwrap_err();
        assert_eq!(err.found, Token::End);
        assert_eq!(err.position, 5);
        assert!(err.expected.contains(&"PREDICATE"));

        let err = parse(&ltl, "(a or b").unwrap_err();
        assert_eq!(err.found, Token::End);
        assert!(err.expected.contains(&"')'"));

        let err = parse(&ltl, "a b").unwrap_err();
        assert_eq!(err.found, Token::Predicate("b".to_string()));
        assert_eq!(err.position, 2);

        let err = parse(&ltl, "a && b").unwrap_err();
        assert!(matches!(err.found, Token::Invalid(_)));
        let message = err.to_string();
        assert!(message.starts_with("unexpected INVALID \"&"), "{}", message);
        assert!(message.ends_with("at offset 2 (expect and, or, until, release, end of input)"));
    }
}
