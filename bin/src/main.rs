use std::{
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser as _;

use interpreter::{InterpretError, Interpreter};
use parser::Parser;
use scanner::TokenStream;

/// Tree-walking interpreter for a small Lox dialect.
#[derive(clap::Parser)]
#[command(version)]
struct Args {
    /// Script to run. Starts an interactive prompt when omitted.
    file: Option<PathBuf>,

    /// Print the parsed statements to stderr before running them.
    #[arg(long)]
    dump_ast: bool,
}

// Exit codes from sysexits.h
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;

fn report(error: &InterpretError) -> String {
    match error {
        InterpretError::CompileError(e) => e.to_string(),
        InterpretError::RuntimeError(e) => format!("{e}\n[line {}]", e.line()),
    }
}

fn run(source: &str, interpreter: &mut Interpreter, args: &Args) -> Result<(), InterpretError> {
    let stmts = Parser::new(TokenStream::new(source)).parse()?;

    if args.dump_ast {
        for stmt in &stmts {
            eprintln!("{stmt}");
        }
    }

    let mut out = stdout().lock();
    let result = interpreter.interpret(&stmts, &mut out);
    // Output produced before a runtime error still has to show up.
    if let Err(e) = out.flush() {
        log::warn!("Could not flush stdout: {e}");
    }
    result?;
    Ok(())
}

fn run_file(path: &Path, interpreter: &mut Interpreter, args: &Args) -> anyhow::Result<ExitCode> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;

    match run(&source, interpreter, args) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{}", report(&e));
            Ok(ExitCode::from(match e {
                InterpretError::CompileError(_) => EX_DATAERR,
                InterpretError::RuntimeError(_) => EX_SOFTWARE,
            }))
        }
    }
}

fn run_prompt(interpreter: &mut Interpreter, args: &Args) -> anyhow::Result<ExitCode> {
    loop {
        print!("> ");
        stdout().flush()?;

        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            return Ok(ExitCode::SUCCESS);
        }

        if let Err(e) = run(&line, interpreter, args) {
            log::debug!("{:?}", e);
            eprintln!("{}", report(&e));
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    let mut interpreter = Interpreter::new();

    match &args.file {
        Some(file) => run_file(file, &mut interpreter, &args),
        None => run_prompt(&mut interpreter, &args),
    }
}
