//! fortfold - style and fold a Fortran source file
//!
//! Prints the file highlighted, or its fold levels, or its raw style runs.

use std::env;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fortfold::error::{FortfoldError, Result};
use fortfold::syntax::{Document, SourceFormat, SyntaxManager};
use fortfold::{render, Config};

/// What to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Highlight,
    Folds,
    Spans,
}

#[derive(Debug, PartialEq, Eq)]
struct Options {
    format: Option<SourceFormat>,
    view: View,
    config: Option<PathBuf>,
    file: PathBuf,
}

/// Parsed command line
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(Options),
    Help,
    Version,
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to stderr, filtered by FORTFOLD_LOG (e.g. `FORTFOLD_LOG=fortfold=debug`)
fn init_tracing() {
    if let Ok(filter) = EnvFilter::try_from_env("FORTFOLD_LOG") {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .init();
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args)? {
        Command::Run(options) => options,
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Version => {
            print_version();
            return Ok(());
        }
    };

    let config = match &options.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let format = options
        .format
        .or(config.format)
        .or_else(|| SourceFormat::from_path(&options.file))
        .unwrap_or_default();
    debug!(file = %options.file.display(), %format, view = ?options.view, "starting");

    let mut doc = Document::from_bytes(fs::read(&options.file)?);
    config.apply_to(&mut doc);
    let manager = SyntaxManager::with_words(format, config.keyword_sets());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match options.view {
        View::Highlight => {
            let color = stdout.is_terminal();
            render::highlighted(&mut out, &mut doc, &manager, color)
        }
        View::Folds => render::folds(&mut out, &mut doc, &manager),
        View::Spans => render::spans(&mut out, &mut doc, &manager),
    }
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut format = None;
    let mut view = View::Highlight;
    let mut config = None;
    let mut file = None;

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--fixed" => format = Some(SourceFormat::Fixed),
            "--free" => format = Some(SourceFormat::Free),
            "--folds" => view = View::Folds,
            "--spans" => view = View::Spans,
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| FortfoldError::Usage(format!("{} needs a path", arg)))?;
                config = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') => {
                return Err(FortfoldError::Usage(format!("unknown option {}", other)));
            }
            other => {
                if file.is_some() {
                    return Err(FortfoldError::Usage("only one file may be given".to_string()));
                }
                file = Some(PathBuf::from(other));
            }
        }
    }

    let file = file.ok_or_else(|| FortfoldError::Usage("no input file (try --help)".to_string()))?;
    Ok(Command::Run(Options {
        format,
        view,
        config,
        file,
    }))
}

fn print_usage() {
    println!("fortfold {} - Fortran syntax styling and folding", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: fortfold [OPTIONS] FILE");
    println!();
    println!("Options:");
    println!("  --fixed            Treat FILE as fixed-form source");
    println!("  --free             Treat FILE as free-form source");
    println!("  --folds            Print fold level and flags of each line");
    println!("  --spans            Print the style runs of each line");
    println!("  -c, --config PATH  Read settings from PATH instead of ~/.fortfold.toml");
    println!("  -h, --help         Show this help message");
    println!("  -V, --version      Show version information");
    println!();
    println!("The layout is taken from the file extension when not given:");
    println!("  .f .for .f77 .ftn are fixed form, everything else is free form.");
    println!();
    println!("Set FORTFOLD_LOG=fortfold=debug to trace styling passes on stderr.");
}

fn print_version() {
    println!("fortfold {}", env!("CARGO_PKG_VERSION"));
}
