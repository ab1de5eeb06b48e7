use cursor::Line;
use errors::LoxErrors;
use scanner::Token;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum TypeError {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operands must be numbers or strings.")]
    OperandsMustBeNumbersOrStrings,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ArithmeticError {
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Repeated string would be too large.")]
    RepeatTooLarge,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Could not write output: {0}")]
    Output(std::io::ErrorKind),
}

/// An error raised while executing, attributed to the token of the failing
/// operator, variable or statement.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub token: Token,
}

impl RuntimeError {
    pub fn new(kind: impl Into<ErrorKind>, token: &Token) -> Self {
        Self { kind: kind.into(), token: token.clone() }
    }

    pub fn line(&self) -> Line {
        self.token.line()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InterpretError {
    #[error("{0}")]
    CompileError(#[from] LoxErrors),
    #[error("{0}")]
    RuntimeError(#[from] RuntimeError),
}
