use std::fmt::{self, Display, Formatter};

use parser::LiteralValue;

use crate::error::{ArithmeticError, ErrorKind, TypeError};

#[derive(Debug, Clone, PartialEq, derive_more::From, derive_more::IsVariant)]
pub enum Value {
    #[from(ignore)]
    Nil,
    Boolean(bool),
    Number(f64),
    Str(String),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Equality as seen by `==`: same case and same contents, never across cases.
    pub fn is_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, _) | (_, Value::Nil) => false,

            (lhs, rhs) => lhs.eq(rhs),
        }
    }

    pub fn negate(&self) -> Result<Value, ErrorKind> {
        match self {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(TypeError::OperandMustBeNumber.into()),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, ErrorKind> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::Str(a), Value::Number(b)) => Ok(Value::Str(format!("{a}{}", format_number(*b)))),
            (Value::Number(a), Value::Str(b)) => Ok(Value::Str(format!("{}{b}", format_number(*a)))),
            _ => Err(TypeError::OperandsMustBeNumbersOrStrings.into()),
        }
    }

    pub fn subtract(&self, other: &Value) -> Result<Value, ErrorKind> {
        let (a, b) = number_operands(self, other)?;
        Ok(Value::Number(a - b))
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, ErrorKind> {
        match (self, other) {
            (Value::Str(s), Value::Number(n)) | (Value::Number(n), Value::Str(s)) => {
                repeat(s, *n).map(Value::Str)
            }
            _ => {
                let (a, b) = number_operands(self, other)?;
                Ok(Value::Number(a * b))
            }
        }
    }

    pub fn divide(&self, other: &Value) -> Result<Value, ErrorKind> {
        let (a, b) = number_operands(self, other)?;
        if b == 0.0 {
            return Err(ArithmeticError::DivisionByZero.into());
        }
        Ok(Value::Number(a / b))
    }

    /// Floating-point remainder, the result takes the sign of the dividend.
    pub fn remainder(&self, other: &Value) -> Result<Value, ErrorKind> {
        let (a, b) = number_operands(self, other)?;
        Ok(Value::Number(a % b))
    }

    pub fn greater(&self, other: &Value) -> Result<Value, ErrorKind> {
        let (a, b) = number_operands(self, other)?;
        Ok(Value::Boolean(a > b))
    }

    pub fn greater_equal(&self, other: &Value) -> Result<Value, ErrorKind> {
        let (a, b) = number_operands(self, other)?;
        Ok(Value::Boolean(a >= b))
    }

    pub fn less(&self, other: &Value) -> Result<Value, ErrorKind> {
        let (a, b) = number_operands(self, other)?;
        Ok(Value::Boolean(a < b))
    }

    pub fn less_equal(&self, other: &Value) -> Result<Value, ErrorKind> {
        let (a, b) = number_operands(self, other)?;
        Ok(Value::Boolean(a <= b))
    }
}

fn number_operands(a: &Value, b: &Value) -> Result<(f64, f64), ErrorKind> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(TypeError::OperandsMustBeNumbers.into()),
    }
}

/// Upper bound on the byte length of a repeated string.
const MAX_REPEAT_LEN: usize = 1 << 28;

/// `s` repeated `count` times, where `count` is truncated towards zero.
/// Anything below one yields the empty string.
fn repeat(s: &str, count: f64) -> Result<String, ErrorKind> {
    let count = count.trunc();
    if count.is_nan() || count < 1.0 || s.is_empty() {
        return Ok(String::new());
    }

    // Saturates at usize::MAX, which the length check below rejects.
    let count = count as usize;
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(s.repeat(count)),
        _ => Err(ArithmeticError::RepeatTooLarge.into()),
    }
}

/// Number text as Lox prints it: plain decimals for magnitudes in
/// `[1e-3, 1e7)` and for zero, scientific notation like `1.0E21` otherwise.
/// A trailing `.0` is dropped, so `3.0` prints as `3`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    } else if n == f64::INFINITY {
        return "Infinity".to_string();
    } else if n == f64::NEG_INFINITY {
        return "-Infinity".to_string();
    }

    let magnitude = n.abs();
    if n == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return n.to_string();
    }

    // `{:e}` yields the shortest digits, e.g. `1e21` or `1.5e-5`.
    let scientific = format!("{n:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<&LiteralValue> for Value {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::Str(s) => Value::Str(s.clone()),
            LiteralValue::Boolean(b) => Value::Boolean(*b),
            LiteralValue::Nil => Value::Nil,
        }
    }
}
