use clap::Parser as _;
use deco::{grammar, Lexer, ParseError, Parser, Token};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
enum CommandError {
    #[error("I/O error")]
    Io(
        #[from]
        #[source]
        io::Error,
    ),
    #[error("Could not write the JSON report")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
    #[error("Detected one or more errors")]
    HasError,
}

#[derive(Debug, clap::Parser)]
#[clap(about = "Check DeCo programs for lexical and syntax errors")]
struct Cli {
    /// Files to check; reads stdin when none are given
    files: Vec<PathBuf>,
    /// Print every token before checking
    #[clap(long)]
    tokens: bool,
    /// Print the FIRST set of every nonterminal
    #[clap(long)]
    first_sets: bool,
    /// Emit a machine-readable report
    #[clap(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    accepted: bool,
    errors: Vec<ErrorReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<Vec<Token>>,
}

#[derive(Debug, Serialize)]
struct ErrorReport {
    message: String,
    line: u32,
    column: u32,
    syntax: bool,
}

impl From<&ParseError> for ErrorReport {
    fn from(e: &ParseError) -> Self {
        let (line, column) = e.position();
        ErrorReport {
            message: e.to_string(),
            line,
            column,
            syntax: e.is_syntax(),
        }
    }
}

fn main() -> Result<(), CommandError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();
    if cli.first_sets {
        print_first_sets()?;
        if cli.files.is_empty() {
            return Ok(());
        }
    }

    let inputs = read_inputs(&cli.files)?;
    let mut has_error = false;
    let mut reports = Vec::new();
    for (name, source) in &inputs {
        let tokens = if cli.tokens {
            Some(Lexer::new(source).collect::<Vec<_>>())
        } else {
            None
        };
        let mut parser = Parser::new(source);
        let accepted = parser.parse().is_ok();
        has_error |= !accepted;
        if cli.json {
            reports.push(FileReport {
                file: name.clone(),
                accepted,
                errors: parser.errors().iter().map(ErrorReport::from).collect(),
                tokens,
            });
            continue;
        }
        if let Some(tokens) = &tokens {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for token in tokens {
                writeln!(out, "{}", token)?;
            }
        }
        for error in parser.lex_errors() {
            eprintln!("{}: {}", name, error);
        }
        if !accepted && inputs.len() > 1 {
            println!("{}:", name);
        }
        parser.print_diagnostics()?;
    }
    if cli.json {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &reports)?;
        writeln!(out)?;
    }
    if has_error {
        return Err(CommandError::HasError);
    }
    Ok(())
}

fn read_inputs(files: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>, CommandError> {
    if files.is_empty() {
        let mut source = Vec::new();
        io::stdin().read_to_end(&mut source)?;
        return Ok(vec![(String::from("<stdin>"), source)]);
    }
    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        inputs.push((file.display().to_string(), std::fs::read(file)?));
    }
    Ok(inputs)
}

fn print_first_sets() -> Result<(), CommandError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    grammar::write_first_sets(&mut out)?;
    match grammar::check_decisions() {
        Ok(()) => writeln!(
            out,
            "All {} decision points are LL(1).",
            grammar::DECISIONS.len()
        )?,
        Err(conflict) => writeln!(out, "Conflict: {}", conflict)?,
    }
    Ok(())
}
