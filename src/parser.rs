use core::fmt;
use std::{borrow::Cow, iter::FusedIterator};

use itertools::Itertools;
use logos::Logos;

use crate::{
    error::{Location, SyntaxErrorKind, WispError},
    stack::ensure_sufficient_stack,
    value::{write_boolean, write_number, write_quoted},
};

#[derive(Debug, Clone, Default, PartialEq)]
enum LexError {
    #[default]
    UnexpectedInput,
    InvalidEscape(char),
}

#[derive(Debug, Logos, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = LexError)]
enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    // Only a whole token counts, `#tx` lexes as an identifier
    #[token("#t", |_| true)]
    #[token("#f", |_| false)]
    Boolean(bool),

    #[regex(r#""([^"\\]|\\(.|\n))*""#, unescape)]
    String(Cow<'a, str>),

    #[regex(r#"[^()\s"][^()\s]*"#, |lex| lex.slice())]
    Identifier(&'a str),
}

fn unescape<'a>(lex: &mut logos::Lexer<'a, Token<'a>>) -> Result<Cow<'a, str>, LexError> {
    let slice = lex.slice();
    let body = &slice[1..slice.len() - 1];
    if !body.contains('\\') {
        return Ok(Cow::Borrowed(body));
    }

    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => text.push('"'),
            Some('\\') => text.push('\\'),
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some(other) => return Err(LexError::InvalidEscape(other)),
            // The token regex never ends a literal on a lone backslash
            None => return Err(LexError::UnexpectedInput),
        }
    }

    Ok(Cow::Owned(text))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal<'a> {
    Identifier(&'a str),
    String(Cow<'a, str>),
    // Reserved, the grammar has no number literals yet
    Number(f64),
    Boolean(bool),
}

// Sexps are the basic building blocks of a program
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp<'a> {
    Atom(Literal<'a>),
    Expression(Vec<Self>),
}

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(identifier) => f.write_str(identifier),
            Self::String(string) => write_quoted(f, string),
            Self::Number(number) => write_number(f, *number),
            Self::Boolean(boolean) => write_boolean(f, *boolean),
        }
    }
}

impl fmt::Display for Sexp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self {
            Self::Atom(literal) => fmt::Display::fmt(literal, f),
            Self::Expression(expression) => write!(f, "({})", expression.iter().join(" ")),
        })
    }
}

// Nested expressions are dropped from a heap stack, however deep they go
impl Drop for Sexp<'_> {
    fn drop(&mut self) {
        let Self::Expression(expression) = self else { return };

        let mut pending = std::mem::take(expression);
        while let Some(mut sexp) = pending.pop() {
            if let Self::Expression(children) = &mut sexp {
                pending.append(children);
            }
        }
    }
}

type ParseResult<O> = Result<O, WispError>;

/// Lazily parses the top-level forms of a source text, one per call to
/// [`Parser::next_form`] or [`Iterator::next`].
///
/// The parser stops for good at the end of input or at the first syntax error.
pub struct Parser<'a> {
    source: &'a str,
    tokens: logos::Lexer<'a, Token<'a>>,
    finished: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, tokens: Token::lexer(source), finished: false }
    }

    fn syntax_error(&self, kind: SyntaxErrorKind, offset: usize) -> WispError {
        WispError::Syntax { kind, location: Location::locate(self.source, offset) }
    }

    fn next_token(&mut self) -> ParseResult<Option<(Token<'a>, usize)>> {
        let result = match self.tokens.next() {
            None => return Ok(None),
            Some(result) => result,
        };

        let offset = self.tokens.span().start;
        match result {
            Ok(token) => Ok(Some((token, offset))),
            Err(LexError::InvalidEscape(c)) => Err(self.syntax_error(SyntaxErrorKind::InvalidEscape(c), offset)),
            Err(LexError::UnexpectedInput) if self.tokens.slice().starts_with('"') => {
                Err(self.syntax_error(SyntaxErrorKind::UnterminatedString, offset))
            }
            Err(LexError::UnexpectedInput) => Err(self.syntax_error(SyntaxErrorKind::UnexpectedCharacter, offset)),
        }
    }

    /// Parses the next top-level form, or returns `Ok(None)` once the input
    /// is exhausted.
    pub fn next_form(&mut self) -> ParseResult<Option<Sexp<'a>>> {
        if self.finished {
            return Ok(None);
        }

        let result = self.parse_form();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    fn parse_form(&mut self) -> ParseResult<Option<Sexp<'a>>> {
        // Lists being built, innermost last, with the offset of their '('
        let mut open: Vec<(usize, Vec<Sexp<'a>>)> = Vec::new();

        loop {
            let Some((token, offset)) = self.next_token()? else {
                return match open.last() {
                    Some((start, _)) => Err(self.syntax_error(SyntaxErrorKind::UnterminatedList, *start)),
                    None => Ok(None),
                };
            };

            let sexp = match token {
                Token::LeftParen => {
                    open.push((offset, Vec::new()));
                    continue;
                }
                Token::RightParen => match open.pop() {
                    Some((_, expression)) => Sexp::Expression(expression),
                    None => return Err(self.syntax_error(SyntaxErrorKind::UnexpectedCloseParen, offset)),
                },
                Token::Boolean(boolean) => Sexp::Atom(Literal::Boolean(boolean)),
                Token::String(string) => Sexp::Atom(Literal::String(string)),
                Token::Identifier(identifier) => Sexp::Atom(Literal::Identifier(identifier)),
            };

            match open.last_mut() {
                Some((_, expression)) => expression.push(sexp),
                None => return Ok(Some(sexp)),
            }
        }
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = ParseResult<Sexp<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_form().transpose()
    }
}

impl FusedIterator for Parser<'_> {}

/// Parses every top-level form of `source`.
pub fn parse(source: &str) -> ParseResult<Vec<Sexp<'_>>> {
    Parser::new(source).collect()
}
