mod token;

pub use token::*;

use once_cell::sync::Lazy;
use std::{collections::HashMap, error::Error, fmt::Display, iter::Peekable, str::Chars};

macro_rules! keyword {
    ($map:ident, $name:ident, $value:expr) => {
        $map.insert($value, Keyword::$name);
    };
}

static KEYWORDS: Lazy<HashMap<&'static str, Keyword>> = Lazy::new(|| {
    let mut m = HashMap::new();

    keyword!(m, Var, "var");
    keyword!(m, Let, "let");
    keyword!(m, Const, "const");
    keyword!(m, Function, "function");
    keyword!(m, If, "if");
    keyword!(m, Else, "else");
    keyword!(m, While, "while");
    keyword!(m, Do, "do");
    keyword!(m, For, "for");
    keyword!(m, In, "in");
    keyword!(m, Return, "return");
    keyword!(m, Throw, "throw");
    keyword!(m, Switch, "switch");
    keyword!(m, Case, "case");
    keyword!(m, Default, "default");
    keyword!(m, Break, "break");
    keyword!(m, Continue, "continue");
    keyword!(m, New, "new");
    keyword!(m, Delete, "delete");
    keyword!(m, Typeof, "typeof");
    keyword!(m, Void, "void");
    keyword!(m, Instanceof, "instanceof");
    keyword!(m, This, "this");
    keyword!(m, True, "true");
    keyword!(m, False, "false");
    keyword!(m, Null, "null");
    keyword!(m, Try, "try");
    keyword!(m, Catch, "catch");
    keyword!(m, Finally, "finally");

    m
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

pub type LexResult<T> = Result<T, LexError>;

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl Error for LexError {}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    tokens: Vec<Token>,
    iterator: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
    newline_before: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: vec![],
            iterator: input.chars().peekable(),
            line: 1,
            col: 1,
            newline_before: false,
        }
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        loop {
            self.newline_before = false;
            self.eat_trivia()?;

            let Some(&next) = self.peek() else {
                break;
            };

            let span = self.span();
            let newline_before = self.newline_before;

            let kind = match next {
                c if is_ident_start(c) => self.lex_word(),
                '0'..='9' => self.lex_number(span)?,
                '.' if self.peek2().is_some_and(|c| c.is_ascii_digit()) => {
                    self.lex_number(span)?
                }
                '\'' | '"' => self.lex_string(span)?,
                _ => self.lex_punct(span)?,
            };

            self.tokens.push(Token {
                kind,
                span,
                newline_before,
            });
        }

        Ok(self.tokens)
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.iterator.peek()
    }

    /// Look one character past the next one. `Chars` clones are cheap.
    fn peek2(&self) -> Option<char> {
        let mut ahead = self.iterator.clone();
        ahead.next();
        ahead.next()
    }

    fn next(&mut self) -> Option<char> {
        let next = self.iterator.next();
        match next {
            Some('\n') => {
                self.line += 1;
                self.col = 1;
                self.newline_before = true;
            }
            Some(_) => self.col += 1,
            None => {}
        }
        next
    }

    fn next_if(&mut self, func: impl FnOnce(&char) -> bool) -> Option<char> {
        if self.peek().map(|c| func(c)).unwrap_or(false) {
            return self.next();
        }
        None
    }

    fn eat(&mut self, expected: char) -> bool {
        self.next_if(|&c| c == expected).is_some()
    }

    /// Skip whitespace and comments, remembering whether a line break
    /// went by.
    fn eat_trivia(&mut self) -> LexResult<()> {
        loop {
            while self.next_if(|c| c.is_whitespace()).is_some() {}

            let next = self.peek().copied();
            match (next, self.peek2()) {
                (Some('/'), Some('/')) => {
                    while self.next_if(|&c| c != '\n').is_some() {}
                }
                (Some('/'), Some('*')) => {
                    let span = self.span();
                    self.next();
                    self.next();
                    loop {
                        match self.next() {
                            Some('*') if self.eat('/') => break,
                            Some(_) => {}
                            None => {
                                return Err(LexError {
                                    message: "unterminated block comment".into(),
                                    span,
                                })
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_word(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(c) = self.next_if(|&c| is_ident_part(c)) {
            word.push(c);
        }

        match KEYWORDS.get(word.as_str()) {
            Some(&keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident(word),
        }
    }

    fn lex_number(&mut self, span: Span) -> LexResult<TokenKind> {
        let mut raw = String::new();

        if self.peek() == Some(&'0') && matches!(self.peek2(), Some('x') | Some('X')) {
            raw.push(self.next().unwrap());
            raw.push(self.next().unwrap());
            while let Some(c) = self.next_if(|c| c.is_ascii_hexdigit()) {
                raw.push(c);
            }
            if raw.len() == 2 {
                return Err(LexError {
                    message: "missing hexadecimal digits".into(),
                    span,
                });
            }
            let value = u64::from_str_radix(&raw[2..], 16).map_err(|_| LexError {
                message: format!("hexadecimal literal '{raw}' out of range"),
                span,
            })? as f64;
            return Ok(TokenKind::Number { value, raw });
        }

        while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
            raw.push(c);
        }
        if self.peek() == Some(&'.') {
            raw.push(self.next().unwrap());
            while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
                raw.push(c);
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            raw.push(self.next().unwrap());
            if matches!(self.peek(), Some('+') | Some('-')) {
                raw.push(self.next().unwrap());
            }
            let mut digits = false;
            while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
                raw.push(c);
                digits = true;
            }
            if !digits {
                return Err(LexError {
                    message: format!("missing exponent digits in '{raw}'"),
                    span,
                });
            }
        }

        let padded = if raw.starts_with('.') {
            format!("0{raw}")
        } else {
            raw.clone()
        };
        let value = padded.parse::<f64>().map_err(|_| LexError {
            message: format!("failed to parse number '{raw}'"),
            span,
        })?;

        Ok(TokenKind::Number { value, raw })
    }

    fn lex_string(&mut self, span: Span) -> LexResult<TokenKind> {
        let quote = self.next().unwrap();
        let mut raw = String::from(quote);
        let mut inner = String::new();

        loop {
            match self.next() {
                Some(c) if c == quote => {
                    raw.push(c);
                    break;
                }
                Some('\\') => {
                    raw.push('\\');
                    inner.push('\\');
                    match self.next() {
                        Some(c) => {
                            raw.push(c);
                            inner.push(c);
                        }
                        None => {
                            return Err(LexError {
                                message: "unterminated string literal".into(),
                                span,
                            })
                        }
                    }
                }
                Some('\n') | None => {
                    return Err(LexError {
                        message: "unterminated string literal".into(),
                        span,
                    })
                }
                Some(c) => {
                    raw.push(c);
                    inner.push(c);
                }
            }
        }

        let value = unescape::unescape(&inner).unwrap_or(inner);
        Ok(TokenKind::Str { value, raw })
    }

    fn lex_punct(&mut self, span: Span) -> LexResult<TokenKind> {
        let next = self.next().unwrap();

        let punct = match next {
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            ';' => Punct::Semicolon,
            ',' => Punct::Comma,
            '.' => Punct::Dot,
            ':' => Punct::Colon,
            '~' => Punct::Tilde,
            '?' => {
                if self.eat('?') {
                    Punct::QuestionQuestion
                } else {
                    Punct::Question
                }
            }
            '+' => {
                if self.eat('+') {
                    Punct::PlusPlus
                } else if self.eat('=') {
                    Punct::PlusAssign
                } else {
                    Punct::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    Punct::MinusMinus
                } else if self.eat('=') {
                    Punct::MinusAssign
                } else {
                    Punct::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    if self.eat('=') {
                        Punct::StarStarAssign
                    } else {
                        Punct::StarStar
                    }
                } else if self.eat('=') {
                    Punct::StarAssign
                } else {
                    Punct::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    Punct::SlashAssign
                } else {
                    Punct::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    Punct::PercentAssign
                } else {
                    Punct::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Punct::EqEqEq
                    } else {
                        Punct::EqEq
                    }
                } else {
                    Punct::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Punct::NotEqEq
                    } else {
                        Punct::NotEq
                    }
                } else {
                    Punct::Bang
                }
            }
            '<' => {
                if self.eat('<') {
                    if self.eat('=') {
                        Punct::LtLtAssign
                    } else {
                        Punct::LtLt
                    }
                } else if self.eat('=') {
                    Punct::LtEq
                } else {
                    Punct::Lt
                }
            }
            '>' => {
                if self.eat('>') {
                    if self.eat('>') {
                        if self.eat('=') {
                            Punct::GtGtGtAssign
                        } else {
                            Punct::GtGtGt
                        }
                    } else if self.eat('=') {
                        Punct::GtGtAssign
                    } else {
                        Punct::GtGt
                    }
                } else if self.eat('=') {
                    Punct::GtEq
                } else {
                    Punct::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    Punct::AmpAmp
                } else if self.eat('=') {
                    Punct::AmpAssign
                } else {
                    Punct::Amp
                }
            }
            '|' => {
                if self.eat('|') {
                    Punct::PipePipe
                } else if self.eat('=') {
                    Punct::PipeAssign
                } else {
                    Punct::Pipe
                }
            }
            '^' => {
                if self.eat('=') {
                    Punct::CaretAssign
                } else {
                    Punct::Caret
                }
            }
            c => {
                return Err(LexError {
                    message: format!("unexpected character '{c}'"),
                    span,
                })
            }
        };

        Ok(TokenKind::Punct(punct))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .lex()
            .expect("lexing failed")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("var of _$$_1"),
            vec![
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Ident("of".into()),
                TokenKind::Ident("_$$_1".into()),
            ]
        );
    }

    #[test]
    fn test_longest_match_puncts() {
        assert_eq!(
            kinds(">>>= === !== ** ??"),
            vec![
                TokenKind::Punct(Punct::GtGtGtAssign),
                TokenKind::Punct(Punct::EqEqEq),
                TokenKind::Punct(Punct::NotEqEq),
                TokenKind::Punct(Punct::StarStar),
                TokenKind::Punct(Punct::QuestionQuestion),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("0 1.5 0xff 2e3 .25"),
            vec![
                TokenKind::Number {
                    value: 0.0,
                    raw: "0".into()
                },
                TokenKind::Number {
                    value: 1.5,
                    raw: "1.5".into()
                },
                TokenKind::Number {
                    value: 255.0,
                    raw: "0xff".into()
                },
                TokenKind::Number {
                    value: 2000.0,
                    raw: "2e3".into()
                },
                TokenKind::Number {
                    value: 0.25,
                    raw: ".25".into()
                },
            ]
        );
    }

    #[test]
    fn test_strings_keep_raw() {
        assert_eq!(
            kinds(r#"'a' "b\n""#),
            vec![
                TokenKind::Str {
                    value: "a".into(),
                    raw: "'a'".into()
                },
                TokenKind::Str {
                    value: "b\n".into(),
                    raw: "\"b\\n\"".into()
                },
            ]
        );
    }

    #[test]
    fn test_newline_before_flag() {
        let tokens = Lexer::new("a\nb // comment\nc d").lex().unwrap();
        let flags = tokens
            .iter()
            .map(|token| token.newline_before)
            .collect::<Vec<_>>();
        assert_eq!(flags, vec![false, true, true, false]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("a /* b\nc */ d // e"),
            vec![TokenKind::Ident("a".into()), TokenKind::Ident("d".into())]
        );
    }

    #[test]
    fn test_error_on_template_literal() {
        assert!(Lexer::new("`template`").lex().is_err());
    }

    #[test]
    fn test_error_on_unterminated_string() {
        assert!(Lexer::new("'abc").lex().is_err());
    }
}
