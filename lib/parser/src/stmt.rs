use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use scanner::Token;

use crate::Expr;

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Print { keyword: Token, value: Expr },
    Var { name: Token, initializer: Option<Expr> },
    Block(Vec<Stmt>),
    If { condition: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression(expr) => write!(f, "(; {})", expr),
            Stmt::Print { value, .. } => write!(f, "(print {})", value),
            Stmt::Var { name, initializer: Some(init) } => {
                write!(f, "(var {} {})", name.lexeme(), init)
            }
            Stmt::Var { name, initializer: None } => write!(f, "(var {})", name.lexeme()),
            Stmt::Block(stmts) if stmts.is_empty() => write!(f, "(block)"),
            Stmt::Block(stmts) => write!(f, "(block {})", stmts.iter().join(" ")),
            Stmt::If { condition, then_branch, else_branch: Some(else_branch) } => {
                write!(f, "(if {} {} {})", condition, then_branch, else_branch)
            }
            Stmt::If { condition, then_branch, else_branch: None } => {
                write!(f, "(if {} {})", condition, then_branch)
            }
        }
    }
}
