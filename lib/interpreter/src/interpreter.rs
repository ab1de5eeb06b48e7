use std::{
    io::Write,
    ops::{Deref, DerefMut},
};

use parser::{Expr, Parser, Stmt};
use scanner::{TokenKind, TokenStream};

mod environment;
pub use environment::Environment;

mod error;
pub use error::*;

mod value;
pub use value::*;

/// Tree-walking interpreter. One instance owns one global environment, so
/// consecutive runs (e.g. lines typed into a REPL) share their variables.
#[derive(Debug, Default)]
pub struct Interpreter {
    environment: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Scans, parses and runs `source`, writing `print` output to `out`.
    /// Nothing is executed if there are compile errors.
    pub fn run_source(&mut self, source: &str, out: &mut impl Write) -> Result<(), InterpretError> {
        let stmts = Parser::new(TokenStream::new(source)).parse()?;
        self.interpret(&stmts, out)?;
        Ok(())
    }

    /// Executes `stmts` in order and stops at the first runtime error.
    /// Output written before the error is kept.
    pub fn interpret(&mut self, stmts: &[Stmt], out: &mut impl Write) -> Result<(), RuntimeError> {
        for s in stmts {
            self.execute(s, out)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt, out: &mut dyn Write) -> Result<(), RuntimeError> {
        log::trace!("Executing {}", stmt);

        match stmt {
            Stmt::Print { keyword, value } => {
                let value = self.evaluate(value)?;
                writeln!(out, "{}", value)
                    .map_err(|e| RuntimeError::new(ErrorKind::Output(e.kind()), keyword))
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme(), value);
                Ok(())
            }
            Stmt::Block(stmts) => {
                let mut scope = Scope::new(self);

                for stmt in stmts {
                    scope.execute(stmt, out)?;
                }

                Ok(())
            }
            Stmt::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch, out)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, out)
                } else {
                    Ok(())
                }
            }
        }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(literal.into()),

            Expr::Grouping(expr) => self.evaluate(expr),

            Expr::Variable(name) => self
                .environment
                .get(name.lexeme())
                .cloned()
                .map_err(|kind| RuntimeError::new(kind, name)),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment
                    .assign(name.lexeme(), value.clone())
                    .map_err(|kind| RuntimeError::new(kind, name))?;
                Ok(value)
            }

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Minus => {
                        right.negate().map_err(|kind| RuntimeError::new(kind, operator))
                    }
                    TokenKind::Bang => Ok((!right.is_truthy()).into()),
                    _ => unreachable!("Parser produced unary operator {}", operator.kind),
                }
            }

            Expr::Logical { left, operator, right } => {
                let left = self.evaluate(left)?;
                let short_circuits = match operator.kind {
                    TokenKind::Or => left.is_truthy(),
                    TokenKind::And => !left.is_truthy(),
                    _ => unreachable!("Parser produced logical operator {}", operator.kind),
                };
                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                let result = match operator.kind {
                    TokenKind::EqualEqual => Ok(left.is_equal(&right).into()),
                    TokenKind::BangEqual => Ok((!left.is_equal(&right)).into()),

                    TokenKind::Greater => left.greater(&right),
                    TokenKind::GreaterEqual => left.greater_equal(&right),
                    TokenKind::Less => left.less(&right),
                    TokenKind::LessEqual => left.less_equal(&right),

                    TokenKind::Plus => left.add(&right),
                    TokenKind::Minus => left.subtract(&right),
                    TokenKind::Star => left.multiply(&right),
                    TokenKind::Slash => left.divide(&right),
                    TokenKind::Percent => left.remainder(&right),

                    _ => unreachable!("Parser produced binary operator {}", operator.kind),
                };
                result.map_err(|kind| RuntimeError::new(kind, operator))
            }
        }
    }
}

/// Block scope that is popped again when dropped, also when the block is left
/// through an error.
struct Scope<'i>(&'i mut Interpreter);

impl<'i> Scope<'i> {
    fn new(interpreter: &'i mut Interpreter) -> Self {
        interpreter.environment.push_scope();
        Self(interpreter)
    }
}

impl Deref for Scope<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.0
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.0.environment.pop_scope();
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use cursor::Line;
    use parser::LiteralValue;
    use pretty_assertions::assert_eq;
    use scanner::Token;

    use super::*;

    #[ctor::ctor]
    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn token(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, Line(1))
    }

    fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal(match value.into() {
            Value::Nil => LiteralValue::Nil,
            Value::Boolean(b) => LiteralValue::Boolean(b),
            Value::Number(n) => LiteralValue::Number(n),
            Value::Str(s) => LiteralValue::Str(s),
        })
    }

    fn binary(left: Expr, kind: TokenKind, lexeme: &str, right: Expr) -> Expr {
        Expr::Binary { left: Box::new(left), operator: token(kind, lexeme), right: Box::new(right) }
    }

    fn logical(left: Expr, kind: TokenKind, lexeme: &str, right: Expr) -> Expr {
        Expr::Logical { left: Box::new(left), operator: token(kind, lexeme), right: Box::new(right) }
    }

    fn variable(name: &str) -> Expr {
        Expr::Variable(token(TokenKind::Identifier, name))
    }

    fn assign(name: &str, value: Expr) -> Expr {
        Expr::Assign { name: token(TokenKind::Identifier, name), value: Box::new(value) }
    }

    fn var(name: &str, initializer: Option<Expr>) -> Stmt {
        Stmt::Var { name: token(TokenKind::Identifier, name), initializer }
    }

    fn print(value: Expr) -> Stmt {
        Stmt::Print { keyword: token(TokenKind::Print, "print"), value }
    }

    fn eval(expr: &Expr) -> Result<Value, RuntimeError> {
        Interpreter::new().evaluate(expr)
    }

    fn run(stmts: &[Stmt]) -> (Result<(), RuntimeError>, String) {
        let mut output = Vec::new();
        let result = Interpreter::new().interpret(stmts, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    fn run_source(source: &str) -> (Result<(), InterpretError>, String) {
        let mut output = Vec::new();
        let result = Interpreter::new().run_source(source, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn division() {
        for (a, b) in [(1.0, 2.0), (-7.0, 3.0), (0.0, 5.0), (1e300, 1e-300)] {
            let expr = binary(literal(a), TokenKind::Slash, "/", literal(b));
            assert_eq!(eval(&expr), Ok(Value::Number(a / b)));
        }

        let expr = binary(literal(1.0), TokenKind::Slash, "/", literal(0.0));
        let error = eval(&expr).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Arithmetic(ArithmeticError::DivisionByZero));
        assert_eq!(error.token.lexeme(), "/");
    }

    #[test]
    fn unary() {
        let negate = |e| Expr::Unary { operator: token(TokenKind::Minus, "-"), right: Box::new(e) };
        let not = |e| Expr::Unary { operator: token(TokenKind::Bang, "!"), right: Box::new(e) };

        assert_eq!(eval(&negate(literal(2.0))), Ok(Value::Number(-2.0)));
        assert_eq!(eval(&not(literal(Value::Nil))), Ok(Value::Boolean(true)));
        assert_eq!(eval(&not(literal(0.0))), Ok(Value::Boolean(false)));
        assert_eq!(
            eval(&negate(literal("2"))).unwrap_err().to_string(),
            "Operand must be a number."
        );
    }

    #[test]
    fn grouping_is_transparent() {
        let expr = Expr::Grouping(Box::new(binary(literal(1.0), TokenKind::Plus, "+", literal(2.0))));
        assert_eq!(eval(&expr), Ok(Value::Number(3.0)));
    }

    #[test]
    fn equality_never_type_errors() {
        let expr = binary(literal("1"), TokenKind::EqualEqual, "==", literal(1.0));
        assert_eq!(eval(&expr), Ok(Value::Boolean(false)));
        let expr = binary(literal(Value::Nil), TokenKind::BangEqual, "!=", literal(false));
        assert_eq!(eval(&expr), Ok(Value::Boolean(true)));
    }

    #[test]
    fn comparison_needs_numbers() {
        let expr = binary(literal("a"), TokenKind::Less, "<", literal(1.0));
        assert_eq!(eval(&expr).unwrap_err().to_string(), "Operands must be numbers.");
    }

    #[test]
    fn logical_returns_operand_values() {
        let expr = logical(literal(Value::Nil), TokenKind::Or, "or", literal("yes"));
        assert_eq!(eval(&expr), Ok(Value::from("yes")));
        let expr = logical(literal(0.0), TokenKind::And, "and", literal("second"));
        assert_eq!(eval(&expr), Ok(Value::from("second")));
        let expr = logical(literal(false), TokenKind::And, "and", literal("second"));
        assert_eq!(eval(&expr), Ok(Value::Boolean(false)));
    }

    #[test]
    fn logical_short_circuits() {
        let expr = logical(literal(true), TokenKind::Or, "or", variable("undefined"));
        assert_eq!(eval(&expr), Ok(Value::Boolean(true)));

        let expr = logical(literal(Value::Nil), TokenKind::And, "and", variable("undefined"));
        assert_eq!(eval(&expr), Ok(Value::Nil));

        let failing = binary(literal(1.0), TokenKind::Slash, "/", literal(0.0));
        let expr = logical(literal(false), TokenKind::Or, "or", failing);
        assert!(eval(&expr).is_err());
    }

    #[test]
    fn string_repetition() {
        let repeat = |n: f64| binary(literal("ab"), TokenKind::Star, "*", literal(n));
        assert_eq!(eval(&repeat(3.0)), Ok(Value::from("ababab")));
        assert_eq!(eval(&repeat(0.9)), Ok(Value::from("")));
        assert_eq!(eval(&repeat(-1.0)), Ok(Value::from("")));
    }

    #[test]
    fn mixed_concatenation() {
        let expr = binary(literal("x="), TokenKind::Plus, "+", literal(2.0));
        assert_eq!(eval(&expr), Ok(Value::from("x=2")));
        let expr = binary(literal(Value::Nil), TokenKind::Plus, "+", literal("x"));
        assert_eq!(eval(&expr).unwrap_err().to_string(), "Operands must be numbers or strings.");
    }

    #[test]
    fn operands_are_evaluated_left_to_right() {
        let mut interpreter = Interpreter::new();
        interpreter.environment.define("a", 1.0.into());
        let expr = binary(
            assign("a", literal("left")),
            TokenKind::Plus,
            "+",
            assign("a", literal("right")),
        );
        assert_eq!(interpreter.evaluate(&expr), Ok(Value::from("leftright")));
        assert_eq!(interpreter.environment().get("a"), Ok(&Value::from("right")));
    }

    #[test]
    fn assignment_yields_value() {
        let mut interpreter = Interpreter::new();
        interpreter.environment.define("a", Value::Nil);
        interpreter.environment.define("b", Value::Nil);

        let expr = assign("a", assign("b", literal(4.0)));
        assert_eq!(interpreter.evaluate(&expr), Ok(Value::Number(4.0)));
        assert_eq!(interpreter.environment().get("a"), Ok(&Value::Number(4.0)));
        assert_eq!(interpreter.environment().get("b"), Ok(&Value::Number(4.0)));
    }

    #[test]
    fn undefined_variables() {
        let error = eval(&variable("nope")).unwrap_err();
        assert_eq!(error.to_string(), "Undefined variable 'nope'.");

        let error = eval(&assign("nope", literal(1.0))).unwrap_err();
        assert_eq!(error.kind, ErrorKind::UndefinedVariable("nope".to_string()));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let mut interpreter = Interpreter::new();
        interpreter.environment.define("x", 2.5.into());
        let expr = binary(variable("x"), TokenKind::Star, "*", literal("ab"));

        let first = interpreter.evaluate(&expr);
        let second = interpreter.evaluate(&expr);
        assert_eq!(first, Ok(Value::from("abab")));
        assert_eq!(first, second);
    }

    #[test]
    fn var_without_initializer_is_nil() {
        let (result, output) = run(&[var("a", None), print(variable("a"))]);
        assert_eq!(result, Ok(()));
        assert_eq!(output, "nil\n");
    }

    #[test]
    fn block_scoping() {
        let (result, output) = run(&[
            Stmt::Block(vec![var("inner", Some(literal(1.0))), print(variable("inner"))]),
            print(variable("inner")),
        ]);
        assert_eq!(output, "1\n");
        assert_eq!(result.unwrap_err().kind, ErrorKind::UndefinedVariable("inner".to_string()));
    }

    #[test]
    fn nested_assignment_mutates_enclosing_binding() {
        let (result, output) = run(&[
            var("a", Some(literal("global"))),
            Stmt::Block(vec![Stmt::Block(vec![Stmt::Expression(assign(
                "a",
                literal("assigned"),
            ))])]),
            print(variable("a")),
        ]);
        assert_eq!(result, Ok(()));
        assert_eq!(output, "assigned\n");
    }

    #[test]
    fn scope_is_popped_on_error() {
        let mut interpreter = Interpreter::new();
        let mut output = Vec::new();
        let stmts = [Stmt::Block(vec![
            var("a", Some(literal(1.0))),
            Stmt::Block(vec![Stmt::Expression(variable("missing"))]),
        ])];

        assert!(interpreter.interpret(&stmts, &mut output).is_err());
        assert_eq!(interpreter.environment().depth(), 0);
        assert!(interpreter.environment().get("a").is_err());
    }

    #[test]
    fn if_else() {
        let branch = |condition: Expr| Stmt::If {
            condition,
            then_branch: Box::new(print(literal("then"))),
            else_branch: Some(Box::new(print(literal("else")))),
        };
        let (_, output) = run(&[branch(literal(0.0)), branch(literal(Value::Nil))]);
        assert_eq!(output, "then\nelse\n");

        let (result, output) = run(&[Stmt::If {
            condition: literal(false),
            then_branch: Box::new(print(literal("then"))),
            else_branch: None,
        }]);
        assert_eq!(result, Ok(()));
        assert_eq!(output, "");
    }

    #[test]
    fn shadowing_program() {
        let (result, output) =
            run_source("var x = 10; { var x = x * 2; print x; } print x;");
        assert!(result.is_ok());
        assert_eq!(output, "20\n10\n");
    }

    #[test]
    fn runtime_error_stops_the_run() {
        let (result, output) = run_source("print \"before\";\nprint \"a\" + 1 / 0;\nprint \"after\";");
        assert_eq!(output, "before\n");
        match result {
            Err(InterpretError::RuntimeError(e)) => {
                assert_eq!(e.to_string(), "Division by zero.");
                assert_eq!(e.line(), Line(2));
            }
            other => panic!("Expected runtime error, got {:?}", other),
        }
    }

    #[test]
    fn compile_errors_prevent_execution() {
        let (result, output) = run_source("print 1;\nprint ;");
        assert_eq!(output, "");
        assert_eq!(
            result.unwrap_err().to_string(),
            "[line 2] Error at ';': Expect expression."
        );
    }

    #[test]
    fn globals_persist_between_runs() {
        let mut interpreter = Interpreter::new();
        let mut output = Vec::new();
        interpreter.run_source("var greeting = \"hi\";", &mut output).unwrap();
        interpreter.run_source("print greeting + \" there\";", &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "hi there\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn output_failures_are_runtime_errors() {
        let error = Interpreter::new().interpret(&[print(literal(1.0))], &mut BrokenPipe).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Output(io::ErrorKind::BrokenPipe));
        assert_eq!(error.token.lexeme(), "print");
    }
}
