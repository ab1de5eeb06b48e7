mod expr;
mod stmt;

use std::iter::Peekable;

use cursor::Line;
use errors::{Location, LoxError, LoxErrors, Result};
pub use expr::{Expr, LiteralValue};
use scanner::{Token, TokenKind, TokenStream};
pub use stmt::Stmt;

use TokenKind::*;

#[derive(Debug)]
pub struct ParserError {
    error: ParserErrorType,
    token: Token,
}

impl From<ParserError> for LoxError {
    fn from(error: ParserError) -> Self {
        let location = match error.token.kind {
            Eof => Location::AtEnd,
            _ => Location::At(error.token.lexeme),
        };
        LoxError::new(error.token.line, location, error.error.to_string())
    }
}

impl ParserError {
    fn new(error: ParserErrorType, token: Token) -> Self {
        Self { token, error }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ParserErrorType {
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expect ';' after value.")]
    ExpectedSemicolonAfterValue,
    #[error("Expect ';' after expression.")]
    ExpectedSemicolonAfterExpression,
    #[error("Expect ';' after variable declaration.")]
    ExpectedSemicolonAfterDeclaration,
    #[error("Expect variable name.")]
    ExpectedVariableName,
    #[error("Expect ')' after expression.")]
    MissingRightParen,
    #[error("Expect '(' after 'if'.")]
    MissingLeftParenAfterIf,
    #[error("Expect ')' after if condition.")]
    MissingRightParenAfterCondition,
    #[error("Expect '}}' after block.")]
    ExpectedRightBrace,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
}

/// Recursive descent parser producing statements from a token stream.
/// Scan errors coming out of the stream are reported like parse errors.
#[derive(Debug)]
pub struct Parser<'a> {
    token_stream: Peekable<TokenStream<'a>>,
    line: Line,
}

impl<'a> Parser<'a> {
    pub fn new(token_stream: TokenStream<'a>) -> Self {
        Self { token_stream: token_stream.peekable(), line: Line(1) }
    }

    /// Parses the whole stream. On failure every error found is returned,
    /// the parser resynchronizes at statement boundaries after each one.
    pub fn parse(mut self) -> std::result::Result<Vec<Stmt>, LoxErrors> {
        let mut errors = LoxErrors::default();
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    errors.push(e);
                    self.synchronize();
                }
            }
        }

        if errors.is_empty() {
            Ok(stmts)
        } else {
            Err(errors)
        }
    }

    fn declaration(&mut self) -> Result<Stmt> {
        if self.consume(Var)?.is_ok() {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume_or_error(Identifier, ParserErrorType::ExpectedVariableName)?;

        let initializer = match self.consume(Equal)? {
            Ok(_) => Some(self.expression()?),
            Err(_) => None,
        };

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterDeclaration)?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt> {
        if let Ok(keyword) = self.consume(Print)? {
            return self.print_statement(keyword);
        }

        if self.consume(LeftBrace)?.is_ok() {
            return self.block();
        }

        if self.consume(If)?.is_ok() {
            return self.if_statement();
        }

        self.expression_statement()
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume_or_error(LeftParen, ParserErrorType::MissingLeftParenAfterIf)?;
        let condition = self.expression()?;
        self.consume_or_error(RightParen, ParserErrorType::MissingRightParenAfterCondition)?;

        let then_branch = Box::new(self.statement()?);

        let else_branch = match self.consume(Else)? {
            Ok(_) => Some(self.statement()?),
            Err(_) => None,
        }
        .map(Box::new);

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn block(&mut self) -> Result<Stmt> {
        let mut stmts = Vec::new();

        while !self.check(&RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }

        self.consume_or_error(RightBrace, ParserErrorType::ExpectedRightBrace)?;
        Ok(Stmt::Block(stmts))
    }

    fn print_statement(&mut self, keyword: Token) -> Result<Stmt> {
        let value = self.expression()?;

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterValue)?;

        Ok(Stmt::Print { keyword, value })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let value = self.expression()?;

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterExpression)?;

        Ok(Stmt::Expression(value))
    }

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.or()?;

        if let Ok(equal) = self.consume(Equal)? {
            let value = Box::new(self.assignment()?);

            if let Expr::Variable(name) = expr {
                return Ok(Expr::Assign { name, value });
            }

            return Err(ParserError::new(ParserErrorType::InvalidAssignmentTarget, equal).into());
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr = self.and()?;

        while let Ok(operator) = self.consume(Or)? {
            let right = Box::new(self.and()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while let Ok(operator) = self.consume(And)? {
            let right = Box::new(self.equality()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.comparison()?;

        while let Some(BangEqual | EqualEqual) = self.peek() {
            let operator = self.advance()?;
            let right = Box::new(self.comparison()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr = self.term()?;

        while let Some(Greater | GreaterEqual | Less | LessEqual) = self.peek() {
            let operator = self.advance()?;
            let right = Box::new(self.term()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr = self.factor()?;

        while let Some(Plus | Minus) = self.peek() {
            let operator = self.advance()?;
            let right = Box::new(self.factor()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;

        while let Some(Star | Slash | Percent) = self.peek() {
            let operator = self.advance()?;
            let right = Box::new(self.unary()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(Minus | Bang) = self.peek() {
            let operator = self.advance()?;
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { operator, right });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        let literal = match self.peek() {
            Some(False) => Some(LiteralValue::Boolean(false)),
            Some(True) => Some(LiteralValue::Boolean(true)),
            Some(Nil) => Some(LiteralValue::Nil),
            Some(Str(s)) => Some(LiteralValue::Str(s.clone())),
            Some(Number(n)) => Some(LiteralValue::Number(*n)),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance()?;
            return Ok(Expr::Literal(literal));
        }

        if let Ok(identifier) = self.consume(Identifier)? {
            return Ok(Expr::Variable(identifier));
        }

        if self.consume(LeftParen)?.is_ok() {
            let expr = self.expression()?;
            self.consume_or_error(RightParen, ParserErrorType::MissingRightParen)?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        match self.consume(Eof)? {
            Ok(token) | Err(token) => {
                Err(ParserError::new(ParserErrorType::ExpectedExpression, token).into())
            }
        }
    }

    /// Skips tokens until the start of what is probably the next statement.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            let previous = self.advance();
            log::debug!("Synchronizing, skipped {:?}", previous);

            if matches!(previous, Ok(Token { kind: Semicolon, .. })) {
                return;
            }

            if let Some(Class | Fun | Var | For | If | While | Print | Return) = self.peek() {
                return;
            }
        }
    }
}

// Helpers
impl<'a> Parser<'a> {
    /// Consumes the next token if it has the given kind. Otherwise the next
    /// token is left in place and handed back as `Err`, so callers can either
    /// try something else or report it. Scan errors are propagated.
    fn consume(&mut self, kind: TokenKind) -> Result<std::result::Result<Token, Token>> {
        debug_assert!(!matches!(kind, Number(_) | Str(_)));
        match self.token_stream.peek() {
            Some(Ok(t)) if t.kind == kind => {}
            Some(Ok(t)) => return Ok(Err(t.clone())),
            Some(Err(err)) => return Err(err.clone()),
            None => return Err(self.end_of_input()),
        }
        self.advance().map(Ok)
    }

    fn consume_or_error(&mut self, kind: TokenKind, error_type: ParserErrorType) -> Result<Token> {
        match self.consume(kind)? {
            Ok(token) => Ok(token),
            Err(token) => Err(ParserError::new(error_type, token).into()),
        }
    }

    /// Kind of the next token, `None` if the next item is a scan error.
    fn peek(&mut self) -> Option<&TokenKind> {
        match self.token_stream.peek() {
            Some(Ok(token)) => Some(&token.kind),
            _ => None,
        }
    }

    fn check(&mut self, kind: &TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    /// Never moves past `Eof`.
    fn advance(&mut self) -> Result<Token> {
        if let Some(Ok(token)) = self.token_stream.peek() {
            self.line = token.line;
            if token.kind == Eof {
                return Ok(token.clone());
            }
        }
        self.token_stream.next().unwrap_or_else(|| Err(self.end_of_input()))
    }

    fn is_at_end(&mut self) -> bool {
        matches!(self.token_stream.peek(), Some(Ok(Token { kind: Eof, .. })) | None)
    }

    fn end_of_input(&self) -> LoxError {
        LoxError::new(self.line, Location::AtEnd, "Unexpected end of input.")
    }
}
