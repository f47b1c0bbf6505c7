use std::io::Write;

use crate::config::{EXIT_OK, EXIT_RUNTIME_ERROR, EXIT_STATIC_ERROR};
use crate::diagnostics::Diagnostics;
use crate::interpreter::{Interpreter, RuntimeError};
use crate::keywords::Keywords;
use crate::parser::ast::Program;
use crate::parser::Parser;
use crate::scanner::Scanner;

/// How a single scan → parse → interpret cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ok,
    /// Scan or parse errors; nothing was executed.
    StaticErrors(Diagnostics),
    RuntimeError(RuntimeError),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Ok => EXIT_OK,
            Outcome::StaticErrors(_) => EXIT_STATIC_ERROR,
            Outcome::RuntimeError(_) => EXIT_RUNTIME_ERROR,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }
}

/// Scans and parses `source`, reporting every error into `diagnostics`.
pub fn parse(source: &str, keywords: &Keywords, diagnostics: &mut Diagnostics) -> Program {
    let tokens = Scanner::new(source, keywords).scan_tokens(diagnostics);
    Parser::new(tokens).parse(diagnostics)
}

pub fn run<W: Write>(
    source: &str,
    keywords: &Keywords,
    interpreter: &mut Interpreter<W>,
) -> Outcome {
    run_with(source, keywords, interpreter, |_| {})
}

/// Like [`run`], but hands the parsed program to `inspect` before it is executed.
pub fn run_with<W: Write>(
    source: &str,
    keywords: &Keywords,
    interpreter: &mut Interpreter<W>,
    inspect: impl FnOnce(&Program),
) -> Outcome {
    let mut diagnostics = Diagnostics::new();
    let program = parse(source, keywords, &mut diagnostics);

    if diagnostics.has_errors() {
        tracing::debug!(errors = diagnostics.len(), "not running program with static errors");
        return Outcome::StaticErrors(diagnostics);
    }

    inspect(&program);

    match interpreter.interpret(&program) {
        Ok(()) => Outcome::Ok,
        Err(error) => Outcome::RuntimeError(error),
    }
}
