//! Rox: a tree‑walking interpreter for a Lox‑family scripting language.
//!
//! The pipeline is scanner → parser → resolver → interpreter. Each stage
//! reports into a run‑scoped [`error::Diagnostics`] sink; [`run`] wires them
//! together and decides how far a program gets.

pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
mod stack;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use error::Diagnostics;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// How far a [`run`] got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    LexFailed,
    /// Syntax or resolution errors; nothing was executed.
    StaticFailed,
    RuntimeFailed,
}

impl RunStatus {
    /// Process exit code used by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::LexFailed | RunStatus::StaticFailed => 65,
            RunStatus::RuntimeFailed => 70,
        }
    }
}

/// Runs a whole program, writing `print` output to `output` and every
/// diagnostic into `diagnostics`.
pub fn run(source: &str, output: Box<dyn Write>, diagnostics: &mut Diagnostics) -> RunStatus {
    let tokens = Scanner::new(source).scan_tokens(diagnostics);

    if diagnostics.had_lex_error() {
        info!("Lexical errors found, stopping before parse");
        return RunStatus::LexFailed;
    }

    let statements = Parser::new(&tokens).parse(diagnostics);

    let mut interpreter = Interpreter::with_output(output);

    if !diagnostics.has_errors() {
        Resolver::new(&mut interpreter).resolve(&statements, diagnostics);
    }

    if diagnostics.has_errors() {
        info!("Static errors found, skipping execution");
        return RunStatus::StaticFailed;
    }

    interpreter.interpret(&statements, diagnostics);

    if diagnostics.had_runtime_error() {
        RunStatus::RuntimeFailed
    } else {
        RunStatus::Completed
    }
}
