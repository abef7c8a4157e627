mod hints;

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use clap::{ArgAction, Parser, Subcommand};
use log::{debug, info, LevelFilter};
use owo_colors::OwoColorize;
use quadrate_lexer::Lexer;
use quadrate_parser::{parse_source, ParseOutput};
use quadrate_syntax::{Diagnostics, Error, Renderer, SourceBuffer, TokenKind};

/// Front-end driver for the Quadrate language.
#[derive(Parser, Debug)]
#[command(name = "quadc", version, about = "Check, tokenize and inspect Quadrate source files")]
struct Cli {
    /// Disable colored output (NO_COLOR is honoured too)
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more; repeat for debug and trace output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse files and report every diagnostic
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the token stream of a file
    Tokens { file: PathBuf },
    /// Print the syntax tree of a file
    Ast {
        file: PathBuf,
        /// Emit JSON instead of the debug tree
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn use_color(no_color: bool, terminal: bool) -> bool {
    !no_color && std::env::var_os("NO_COLOR").is_none() && terminal
}

fn render_fatal(err: &Error, color: bool) {
    if color {
        eprintln!("{}: {}", "error".red().bold(), err.to_string().red());
    } else {
        eprintln!("error: {}", err);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Check { files } => {
            let color = use_color(cli.no_color, std::io::stdout().is_terminal());
            check(files, color)
        }
        Command::Tokens { file } => {
            let color = use_color(cli.no_color, std::io::stderr().is_terminal());
            tokens(file, color).unwrap_or_else(|e| {
                render_fatal(&e, color);
                ExitCode::from(2)
            })
        }
        Command::Ast { file, json } => {
            let color = use_color(cli.no_color, std::io::stderr().is_terminal());
            ast(file, *json, color).unwrap_or_else(|e| {
                render_fatal(&e, color);
                ExitCode::from(2)
            })
        }
    }
}

/// The rendered outcome of checking one file.
struct FileReport {
    text: String,
    errors: usize,
}

fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

fn render_report(diagnostics: &Diagnostics, source: &SourceBuffer<'_>, color: bool) -> String {
    let renderer = Renderer::new(color);
    let mut text = String::new();
    for diag in diagnostics {
        text.push_str(&renderer.render(diag, source));
        if let Some(help) = hints::render_help(diag, color) {
            text.push_str(&help);
        }
        text.push('\n');
    }
    text
}

fn summary(file: &str, errors: usize, color: bool) -> String {
    let line = match errors {
        0 => format!("{}: no errors", file),
        1 => format!("{}: 1 error", file),
        n => format!("{}: {} errors", file, n),
    };
    match (color, errors) {
        (false, _) => line,
        (true, 0) => line.green().to_string(),
        (true, _) => line.red().bold().to_string(),
    }
}

fn check_file(path: &Path, color: bool) -> Result<FileReport, Error> {
    let src = read_source(path)?;
    let source = SourceBuffer::with_name(&src, path.display().to_string());
    let ParseOutput { diagnostics, .. } = parse_source(&source)?;
    debug!("{}: {} diagnostics", path.display(), diagnostics.len());
    let mut text = render_report(&diagnostics, &source, color);
    text.push_str(&summary(&path.display().to_string(), diagnostics.len(), color));
    text.push('\n');
    Ok(FileReport {
        text,
        errors: diagnostics.len(),
    })
}

/// Checks every file on its own thread. Reports print in argument order.
fn check(files: &[PathBuf], color: bool) -> ExitCode {
    info!("checking {} file(s)", files.len());
    let results: Vec<Result<FileReport, Error>> = thread::scope(|s| {
        let handles: Vec<_> = files
            .iter()
            .map(|path| s.spawn(move || check_file(path, color)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut failed = false;
    let mut fatal = false;
    for result in results {
        match result {
            Ok(report) => {
                print!("{}", report.text);
                failed |= report.errors > 0;
            }
            Err(e) => {
                render_fatal(&e, color);
                fatal = true;
            }
        }
    }
    if fatal {
        ExitCode::from(2)
    } else if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn tokens(path: &Path, color: bool) -> Result<ExitCode, Error> {
    let src = read_source(path)?;
    let source = SourceBuffer::with_name(&src, path.display().to_string());
    let mut diagnostics = Diagnostics::new();
    let tokens = Lexer::new(&source).tokenize(&mut diagnostics)?;
    for tok in &tokens {
        let line = if tok.kind == TokenKind::Eof {
            format!("{}:{} {:?}", tok.span.line, tok.span.col, tok.kind)
        } else {
            format!(
                "{}:{} {:?} {}",
                tok.span.line, tok.span.col, tok.kind, tok.lexeme
            )
        };
        println!("{}", line);
    }
    Ok(finish(&diagnostics, &source, color))
}

fn ast(path: &Path, json: bool, color: bool) -> Result<ExitCode, Error> {
    let src = read_source(path)?;
    let source = SourceBuffer::with_name(&src, path.display().to_string());
    let output = parse_source(&source)?;
    if json {
        match serde_json::to_string_pretty(&output.program) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error: cannot serialize syntax tree: {}", e);
                return Ok(ExitCode::from(2));
            }
        }
    } else {
        println!("{:#?}", output.program);
    }
    Ok(finish(&output.diagnostics, &source, color))
}

/// Prints any diagnostics to stderr and picks the exit status.
fn finish(diagnostics: &Diagnostics, source: &SourceBuffer<'_>, color: bool) -> ExitCode {
    if diagnostics.is_empty() {
        return ExitCode::SUCCESS;
    }
    eprint!("{}", render_report(diagnostics, source, color));
    eprintln!(
        "{}",
        summary(source.name().unwrap_or("<input>"), diagnostics.len(), color)
    );
    ExitCode::FAILURE
}
