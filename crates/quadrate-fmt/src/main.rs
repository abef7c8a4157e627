use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, info};
use quadrate_fmt::format_program_with_comments;
use quadrate_parser::parse_source;
use quadrate_syntax::{Error, Renderer, SourceBuffer};

/// Formats a Quadrate source file in canonical layout.
#[derive(Parser, Debug)]
#[command(name = "quadfmt", version, about = "Format Quadrate source files")]
struct Cli {
    /// Exit with status 1 if the file is not already formatted
    #[arg(long, conflicts_with = "write")]
    check: bool,

    /// Rewrite the file in place
    #[arg(long)]
    write: bool,

    /// Source file to format
    file: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("quadfmt: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let src = fs::read_to_string(&cli.file).map_err(|e| Error::io(&cli.file, e))?;
    let source = SourceBuffer::with_name(&src, cli.file.display().to_string());
    let parsed = parse_source(&source)?;

    if parsed.has_errors() {
        let color = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        eprint!("{}", Renderer::new(color).render_all(&parsed.diagnostics, &source));
        eprintln!("{}: not formatting a file with errors", cli.file.display());
        return Ok(ExitCode::FAILURE);
    }

    let formatted = format_program_with_comments(&parsed.program, &parsed.comments);
    if cli.check {
        if normalize_newlines(&formatted) != normalize_newlines(&src) {
            eprintln!("{}: not formatted", cli.file.display());
            return Ok(ExitCode::FAILURE);
        }
        println!("{}: ok", cli.file.display());
    } else if cli.write {
        if formatted == src {
            debug!("{} already formatted", cli.file.display());
        } else {
            fs::write(&cli.file, &formatted).map_err(|e| Error::io(&cli.file, e))?;
            info!("rewrote {}", cli.file.display());
        }
    } else {
        print!("{}", formatted);
    }
    Ok(ExitCode::SUCCESS)
}

fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n")
}
