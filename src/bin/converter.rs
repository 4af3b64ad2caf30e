//! Fatura Converter - CLI tool for normalizing card statements.
//!
//! Reads statement text (Itaú PDF text, OFX or CSV), prints the normalized
//! statement as JSON, or re-exports it as OFX.

use clap::{Parser, ValueEnum};
use fatura::{
    intake, ofx_format::OfxStatement, parse_statement, parse_with, Format, Result, Statement,
};
use std::fs::File;
use std::io::{self, Write};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fatura_converter")]
#[command(about = "Convert card statements (Itaú text, OFX, CSV) to JSON or OFX", long_about = None)]
struct Cli {
    /// Input file path (or stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// Input format (auto, itau, ofx, csv)
    #[arg(long = "input-format", default_value = "auto")]
    input_format: String,

    /// Output format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Json)]
    output_format: OutputFormat,

    /// Output file path (or stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Ofx,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Priority: RUST_LOG env var > --verbose flag > default (warn)
fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr).compact())
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let forced = resolve_format(&cli.input_format, cli.input.as_deref())?;

    let text = if let Some(ref input_path) = cli.input {
        intake::read_text(File::open(input_path)?)?
    } else {
        intake::read_text(io::stdin().lock())?
    };

    let statement = match forced {
        Some(format) => parse_with(format, &text),
        None => parse_statement(&text),
    };
    let statement = intake::require_transactions(statement)?;
    info!(
        bank = %statement.bank_name,
        transactions = statement.transactions.len(),
        "statement parsed"
    );

    if let Some(ref output_path) = cli.output {
        let mut file = File::create(output_path)?;
        write_output(&mut file, statement, cli.output_format)?;
    } else {
        let mut stdout = io::stdout();
        write_output(&mut stdout, statement, cli.output_format)?;
    }

    Ok(())
}

/// `auto` defers to the file extension, then to content sniffing.
fn resolve_format(name: &str, input: Option<&str>) -> Result<Option<Format>> {
    if name.eq_ignore_ascii_case("auto") {
        return Ok(input.and_then(Format::from_path));
    }
    name.parse().map(Some)
}

fn write_output<W: Write>(writer: &mut W, statement: Statement, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, &statement)?;
            writeln!(writer)?;
        }
        OutputFormat::Ofx => {
            let ofx: OfxStatement = statement.into();
            ofx.write_to(writer)?;
        }
    }
    Ok(())
}
