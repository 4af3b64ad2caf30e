//! Fatura - card statement parsing library
//!
//! Normalizes Brazilian credit card statements into one [`Statement`] model
//! and exports them back to OFX.
//!
//! # Supported Formats
//!
//! - **Itaú**: text extracted from the issuer's PDF statement
//! - **OFX**: OFX 1.0.2 SGML files
//! - **CSV**: exports with `data`, `lançamento` and `valor` columns
//!
//! Parsing never fails on bad data: unrecognised lines, blocks and rows are
//! skipped, and an unrecognised document yields a statement without
//! transactions.
//!
//! # Examples
//!
//! ## Detecting the format
//!
//! ```
//! use fatura::parse_statement;
//!
//! let text = "Lançamentos: compras e saques\n01/11 FARMACIA PANVEL 125,50\n";
//! let statement = parse_statement(text);
//! assert_eq!(statement.transactions.len(), 1);
//! assert_eq!(statement.transactions[0].date, "01/11");
//! ```
//!
//! ## Converting a statement to OFX
//!
//! ```no_run
//! use std::fs::File;
//! use fatura::csv_format::CsvStatement;
//! use fatura::ofx_format::OfxStatement;
//!
//! let mut input = File::open("fatura.csv")?;
//! let csv = CsvStatement::from_read(&mut input)?;
//!
//! // Convert using From trait
//! let ofx: OfxStatement = csv.into();
//!
//! let mut output = File::create("fatura.ofx")?;
//! ofx.write_to(&mut output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod category;
pub mod normalize;
pub mod itau_format;
pub mod ofx_format;
pub mod csv_format;
pub mod conversion;
pub mod intake;

use std::path::Path;
use std::str::FromStr;
use tracing::debug;

// Re-export commonly used types
pub use category::{category_color, category_icon, detect_category, infer_category, Category};
pub use error::{Error, Result};
pub use ofx_format::export_ofx;
pub use types::{Statement, Transaction};

use csv_format::CsvStatement;
use itau_format::ItauStatement;
use ofx_format::OfxStatement;

const OFX_MARKERS: [&str; 2] = ["<OFX>", "OFXHEADER"];
const CSV_HEADER_PREFIXES: [&str; 2] = ["data,", "data;"];
const ITAU_MARKERS: [&str; 4] = ["Itaú", "itau", "ITAÚ", "Cartões"];

/// Supported statement formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Text extracted from an Itaú PDF statement
    Itau,
    /// OFX 1.0.2 SGML
    Ofx,
    /// Delimited text export
    Csv,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "itau" | "itaú" | "pdf" | "txt" => Ok(Format::Itau),
            "ofx" | "qfx" => Ok(Format::Ofx),
            "csv" => Ok(Format::Csv),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl Format {
    /// Sniff the format of a document.
    ///
    /// OFX signatures win over a CSV header, which wins over issuer names.
    /// Anything unrecognised is treated as Itaú text.
    pub fn detect(text: &str) -> Self {
        if OFX_MARKERS.iter().any(|m| text.contains(m)) {
            return Format::Ofx;
        }

        let first_line = text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_lowercase();
        if CSV_HEADER_PREFIXES.iter().any(|p| first_line.starts_with(p)) {
            return Format::Csv;
        }

        if !ITAU_MARKERS.iter().any(|m| text.contains(m)) {
            debug!("no issuer marker found, falling back to Itaú layout");
        }
        Format::Itau
    }

    /// Guess the format from a file name's extension.
    ///
    /// Plain `.txt` files are left to [`Format::detect`], since any of the
    /// three formats may be saved under that extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.eq_ignore_ascii_case("txt"))
            .and_then(|ext| ext.parse().ok())
    }

    /// Get file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Itau => "pdf",
            Format::Ofx => "ofx",
            Format::Csv => "csv",
        }
    }
}

/// Detect the format of `text` and parse it.
///
/// Never fails: an unrecognised document yields a statement without
/// transactions.
pub fn parse_statement(text: &str) -> Statement {
    parse_with(Format::detect(text), text)
}

/// Parse `text` as the given format.
pub fn parse_with(format: Format, text: &str) -> Statement {
    debug!(?format, "parsing statement");
    match format {
        Format::Itau => ItauStatement::parse(text).statement,
        Format::Ofx => OfxStatement::parse(text).statement,
        Format::Csv => CsvStatement::parse(text).statement,
    }
}
