use cursor::{Cursor, Line};
use errors::{Location, LoxError};

pub mod token;
pub use token::{Token, TokenKind};
use TokenKind::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Unexpected character.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
}

impl ScanError {
    fn at(self, line: Line) -> LoxError {
        LoxError::new(line, Location::Unknown, self.to_string())
    }
}

/// Lazily turns source text into tokens. Scan errors are yielded in place of
/// the offending token so the consumer can report them and keep going. The
/// stream always ends with a single `Eof` token.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    cursor: Cursor<'a>,
    emitted_eof: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { cursor: Cursor::new(source), emitted_eof: false }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(' ' | '\r' | '\t' | '\n') => {
                    self.cursor.next();
                }
                Some('/') if self.cursor.peek_next() == Some('/') => {
                    self.cursor.advance_while(|c| c != '\n');
                }
                _ => return,
            }
        }
    }

    fn token(&self, kind: TokenKind, start: &Cursor<'a>) -> Token {
        Token::new(kind, start.slice_until(&self.cursor), start.line())
    }

    fn string(&mut self, start: &Cursor<'a>) -> Result<Token, LoxError> {
        self.cursor.advance_while(|c| c != '"');

        if !self.cursor.advance_if('"') {
            return Err(ScanError::UnterminatedString.at(self.cursor.line()));
        }

        let lexeme = start.slice_until(&self.cursor);
        let contents = &lexeme[1..lexeme.len() - 1];
        Ok(self.token(Str(contents.to_string()), start))
    }

    fn number(&mut self, start: &Cursor<'a>) -> Token {
        self.cursor.advance_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.next();
            self.cursor.advance_while(|c| c.is_ascii_digit());
        }

        let lexeme = start.slice_until(&self.cursor);
        let value = match lexeme.parse::<f64>() {
            Ok(value) => value,
            Err(_) => unreachable!("Scanned non-numeric lexeme {lexeme} as number"),
        };
        self.token(Number(value), start)
    }

    fn identifier(&mut self, start: &Cursor<'a>) -> Token {
        self.cursor.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let kind = TokenKind::keyword(start.slice_until(&self.cursor)).unwrap_or(Identifier);
        self.token(kind, start)
    }

    fn scan_token(&mut self) -> Option<Result<Token, LoxError>> {
        self.skip_whitespace_and_comments();

        let start = self.cursor.clone();
        let c = match self.cursor.next() {
            Some(c) => c,
            None if self.emitted_eof => return None,
            None => {
                self.emitted_eof = true;
                return Some(Ok(self.token(Eof, &start)));
            }
        };

        let kind = match c {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            ',' => Comma,
            '.' => Dot,
            '-' => Minus,
            '+' => Plus,
            ';' => Semicolon,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,

            '!' if self.cursor.advance_if('=') => BangEqual,
            '!' => Bang,
            '=' if self.cursor.advance_if('=') => EqualEqual,
            '=' => Equal,
            '<' if self.cursor.advance_if('=') => LessEqual,
            '<' => Less,
            '>' if self.cursor.advance_if('=') => GreaterEqual,
            '>' => Greater,

            '"' => return Some(self.string(&start)),
            d if d.is_ascii_digit() => return Some(Ok(self.number(&start))),
            a if a.is_ascii_alphabetic() || a == '_' => return Some(Ok(self.identifier(&start))),

            c => return Some(Err(ScanError::UnexpectedCharacter(c).at(start.line()))),
        };

        Some(Ok(self.token(kind, &start)))
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Result<Token, LoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan_token()
    }
}
