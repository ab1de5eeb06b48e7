use std::fmt::Display;

use cursor::Line;

/// A lexical unit. Tokens own their text so that AST nodes can keep them
/// around independently of the source they were scanned from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: Line,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: Line) -> Self {
        Self { kind, lexeme: lexeme.into(), line }
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn line(&self) -> Line {
        self.line
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

#[derive(Debug, Clone, PartialEq, strum::Display)]
pub enum TokenKind {
    // Single-character tokens.
    #[strum(serialize = "(")]
    LeftParen,
    #[strum(serialize = ")")]
    RightParen,
    #[strum(serialize = "{")]
    LeftBrace,
    #[strum(serialize = "}")]
    RightBrace,
    #[strum(serialize = ",")]
    Comma,
    #[strum(serialize = ".")]
    Dot,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = ";")]
    Semicolon,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = "*")]
    Star,
    #[strum(serialize = "%")]
    Percent,

    // One or two character tokens.
    #[strum(serialize = "!")]
    Bang,
    #[strum(serialize = "!=")]
    BangEqual,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "==")]
    EqualEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,

    // Literals.
    #[strum(serialize = "identifier")]
    Identifier,
    #[strum(serialize = "string")]
    Str(String),
    #[strum(serialize = "number")]
    Number(f64),

    // Keywords.
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "class")]
    Class,
    #[strum(serialize = "else")]
    Else,
    #[strum(serialize = "false")]
    False,
    #[strum(serialize = "fun")]
    Fun,
    #[strum(serialize = "for")]
    For,
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "nil")]
    Nil,
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "print")]
    Print,
    #[strum(serialize = "return")]
    Return,
    #[strum(serialize = "super")]
    Super,
    #[strum(serialize = "this")]
    This,
    #[strum(serialize = "true")]
    True,
    #[strum(serialize = "var")]
    Var,
    #[strum(serialize = "while")]
    While,

    #[strum(serialize = "end of file")]
    Eof,
}

impl TokenKind {
    /// Reserved words, including the ones that only exist so they can't be
    /// used as variable names.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match ident {
            "and" => And,
            "class" => Class,
            "else" => Else,
            "false" => False,
            "for" => For,
            "fun" => Fun,
            "if" => If,
            "nil" => Nil,
            "or" => Or,
            "print" => Print,
            "return" => Return,
            "super" => Super,
            "this" => This,
            "true" => True,
            "var" => Var,
            "while" => While,
            _ => return None,
        })
    }
}
