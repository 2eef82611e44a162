use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::Diagnostics;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token instead of `TYPE lexeme literal`
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a program and prints the AST of every statement
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Rox program
    Run { filename: PathBuf },
}

/// Reads a source file and decodes it as UTF‑8.
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Prints every collected diagnostic to stderr.
fn report(diagnostics: &Diagnostics) {
    for error in diagnostics.iter() {
        debug!("Reporting diagnostic: {}", error);
        eprintln!("{}", error);
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            let source = read_file(filename)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let mut tokenized = true;

            for token in Scanner::new(&source) {
                match token {
                    Ok(token) => {
                        debug!("Scanned token: {}", token);

                        if json {
                            let line = serde_json::to_string(&token)
                                .context("Failed to serialize token")?;
                            writeln!(out, "{}", line)?;
                        } else {
                            writeln!(out, "{}", token)?;
                        }
                    }

                    Err(e) => {
                        tokenized = false;

                        debug!("Tokenization debug: {}", e);

                        eprintln!("{}", e);
                    }
                }
            }

            out.flush()?;

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");
            let source = read_file(filename)?;
            let mut diagnostics = Diagnostics::new();

            let tokens = Scanner::new(&source).scan_tokens(&mut diagnostics);
            let statements = Parser::new(&tokens).parse(&mut diagnostics);

            if diagnostics.has_errors() {
                report(&diagnostics);
                std::process::exit(65);
            }

            for stmt in &statements {
                let ast_str = AstPrinter::print_stmt(stmt);

                debug!("AST: {}", ast_str);
                println!("{}", ast_str);
            }

            info!("Parse subcommand completed");
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");

            let source = read_file(filename)?;
            let mut diagnostics = Diagnostics::new();

            let tokens = Scanner::new(&source).scan_tokens(&mut diagnostics);

            if diagnostics.has_errors() {
                report(&diagnostics);
                std::process::exit(65);
            }

            let expr = match Parser::new(&tokens).parse_expression(&mut diagnostics) {
                Some(expr) => expr,
                None => {
                    report(&diagnostics);
                    std::process::exit(65);
                }
            };

            info!("Expression parsed successfully");

            let mut interpreter = Interpreter::new();

            match interpreter.evaluate(&expr) {
                Ok(value) => {
                    debug!("Evaluated to: {}", value);
                    println!("{}", value);
                }

                Err(e) => {
                    debug!("Evaluation debug: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(70);
                }
            }

            info!("Evaluate subcommand completed");
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source = read_file(filename)?;

            info!("Provided input:\n {}", source);

            let mut diagnostics = Diagnostics::new();
            let status = rox::run(&source, Box::new(io::stdout()), &mut diagnostics);

            report(&diagnostics);

            info!("Run finished with status {:?}", status);

            if status.exit_code() != 0 {
                std::process::exit(status.exit_code());
            }
        }
    }

    Ok(())
}
