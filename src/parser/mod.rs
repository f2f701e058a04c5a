mod expression;
mod statement;

use std::{error::Error, fmt::Display};

use crate::{
    ast::{Identifier, Program},
    lexer::{Keyword, Punct, Span, Token, TokenKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: Option<Span>,
}

impl ParseError {
    pub fn eof(item: &str) -> ParseError {
        ParseError {
            message: format!("hit EOF while parsing {item}"),
            position: None,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(position) = &self.position {
            write!(f, "{} at {}", self.message, position)
        } else {
            f.write_str(&self.message)
        }
    }
}

impl Error for ParseError {}

/// Parse a whole script from its token stream.
pub fn parse_program(tokens: Vec<Token>) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokens);

    let mut body = vec![];
    while parser.peek().is_some() {
        body.push(parser.parse_statement()?);
    }

    Ok(Program { body })
}

/// Cursor over the token stream. Statement parsing lives in
/// `statement.rs`, expression parsing in `expression.rs`.
#[derive(Debug, Clone)]
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    /// While set, the binary-expression parser refuses to consume the
    /// `in` operator (inside `for` heads).
    no_in: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            no_in: false,
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    pub fn peek_nth(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + offset).map(|token| &token.kind)
    }

    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Whether a line break separates the previous token from the next.
    pub fn newline_before_next(&self) -> bool {
        self.peek().map(|token| token.newline_before).unwrap_or(false)
    }

    pub fn at_punct(&self, punct: Punct) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Punct(p)) if *p == punct)
    }

    pub fn at_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Keyword(k)) if *k == keyword)
    }

    /// Contextual keywords (`of`, `get`, `set`) lex as identifiers.
    pub fn at_contextual(&self, word: &str) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Ident(name)) if name == word)
    }

    pub fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.at_punct(punct) {
            self.index += 1;
            return true;
        }
        false
    }

    pub fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.at_keyword(keyword) {
            self.index += 1;
            return true;
        }
        false
    }

    pub fn expect_punct(&mut self, punct: Punct) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token.kind == TokenKind::Punct(punct) => Ok(()),
            Some(token) => Err(ParseError {
                message: format!("expected '{punct}' but found {}", token.kind.describe()),
                position: Some(token.span),
            }),
            None => Err(ParseError::eof(&format!("'{punct}'"))),
        }
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token.kind == TokenKind::Keyword(keyword) => Ok(()),
            Some(token) => Err(ParseError {
                message: format!("expected '{keyword}' but found {}", token.kind.describe()),
                position: Some(token.span),
            }),
            None => Err(ParseError::eof(&format!("'{keyword}'"))),
        }
    }

    pub fn expect_ident(&mut self) -> Result<Identifier, ParseError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(Identifier { name }),
            Some(token) => Err(ParseError {
                message: format!("expected identifier but found {}", token.kind.describe()),
                position: Some(token.span),
            }),
            None => Err(ParseError::eof("identifier")),
        }
    }

    pub fn unexpected(&mut self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError {
                message: format!("expected {expected} but found {}", token.kind.describe()),
                position: Some(token.span),
            },
            None => ParseError::eof(expected),
        }
    }

    /// Run `func` with the `in` operator allowed again (inside parens,
    /// brackets and argument lists the `for`-head restriction does not
    /// apply).
    pub fn with_in<T>(
        &mut self,
        func: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let no_in = std::mem::replace(&mut self.no_in, false);
        let result = func(self);
        self.no_in = no_in;
        result
    }

    pub fn set_no_in(&mut self, no_in: bool) {
        self.no_in = no_in;
    }

    pub fn no_in(&self) -> bool {
        self.no_in
    }

    /// Statement terminator: an explicit `;`, a closing brace, the end
    /// of input, or a preceding line break.
    pub fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat_punct(Punct::Semicolon)
            || self.at_punct(Punct::RBrace)
            || self.peek().is_none()
            || self.newline_before_next()
        {
            return Ok(());
        }
        Err(self.unexpected("';'"))
    }
}

#[cfg(test)]
pub(crate) fn parse_source(source: &str) -> Result<Program, Box<dyn Error>> {
    let tokens = crate::lexer::Lexer::new(source).lex()?;
    Ok(parse_program(tokens)?)
}
