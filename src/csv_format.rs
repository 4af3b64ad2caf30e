//! CSV statement parser.
//!
//! Accepts ad-hoc exports with at least a date, a description and an amount
//! column (`data`, `lançamento`, `valor`, matched without accents or case).
//! The delimiter is `;` when the header uses it exclusively, `,` otherwise.

use crate::category::detect_category;
use crate::error::Result;
use crate::normalize::{clean_description, parse_amount_flexible, strip_accents};
use crate::types::{Statement, Transaction};
use csv::{ReaderBuilder, StringRecord, Trim};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use tracing::{debug, warn};

/// Institution name reported for CSV imports.
pub const BANK_NAME: &str = "CSV";

/// Normalized names of the date, description and amount columns.
pub const REQUIRED_HEADERS: [&str; 3] = ["data", "lancamento", "valor"];

/// Rows whose description contains one of these are payments or refunds.
const IGNORED_DESCRIPTIONS: [&str; 3] = ["pagamento", "estorno", "devolucao"];

static RE_DATE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static RE_DATE_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}(/\d{4})?$").unwrap());

/// Represents a CSV statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvStatement {
    /// The underlying statement data.
    pub statement: Statement,
}

/// Result of looking at a CSV document.
#[derive(Debug)]
enum CsvOutcome {
    Recognized(Statement),
    NotThisFormat { missing: Vec<&'static str> },
}

/// Positions of the required columns within a row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
    width: usize,
}

impl Columns {
    fn locate(header: &StringRecord) -> std::result::Result<Self, Vec<&'static str>> {
        let names: Vec<String> = header
            .iter()
            .map(|h| strip_accents(h).to_lowercase().trim().to_string())
            .collect();
        let position = |wanted: &str| names.iter().position(|n| n == wanted);

        match (
            position(REQUIRED_HEADERS[0]),
            position(REQUIRED_HEADERS[1]),
            position(REQUIRED_HEADERS[2]),
        ) {
            (Some(date), Some(description), Some(amount)) => Ok(Columns {
                date,
                description,
                amount,
                width: names.len(),
            }),
            _ => Err(REQUIRED_HEADERS
                .into_iter()
                .filter(|h| position(*h).is_none())
                .collect()),
        }
    }
}

impl CsvStatement {
    /// Parse a CSV statement from any source implementing `Read`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use fatura::csv_format::CsvStatement;
    ///
    /// let mut file = File::open("fatura.csv")?;
    /// let csv = CsvStatement::from_read(&mut file)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::parse(&text))
    }

    /// Parse CSV text.
    ///
    /// A header without the required columns yields an empty statement, as
    /// does a file whose rows are all invalid.
    pub fn parse(text: &str) -> Self {
        let statement = match parse_outcome(text) {
            CsvOutcome::Recognized(statement) => statement,
            CsvOutcome::NotThisFormat { missing } => {
                warn!(?missing, "CSV header lacks required columns");
                Statement::new(BANK_NAME)
            }
        };
        CsvStatement { statement }
    }
}

/// Delimiter implied by a header line.
fn detect_delimiter(header: &str) -> u8 {
    if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

fn parse_outcome(text: &str) -> CsvOutcome {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let Some(header_line) = lines.first() else {
        return CsvOutcome::Recognized(Statement::new(BANK_NAME));
    };

    let delimiter = detect_delimiter(header_line);
    let header = match read_record(header_line, delimiter) {
        Ok(Some(header)) => header,
        Ok(None) => return CsvOutcome::Recognized(Statement::new(BANK_NAME)),
        Err(e) => {
            debug!(error = %e, "unreadable CSV header");
            return CsvOutcome::NotThisFormat { missing: REQUIRED_HEADERS.to_vec() };
        }
    };

    let columns = match Columns::locate(&header) {
        Ok(columns) => columns,
        Err(missing) => return CsvOutcome::NotThisFormat { missing },
    };

    let mut statement = Statement::new(BANK_NAME);
    for (i, line) in lines.iter().enumerate().skip(1) {
        match read_record(line, delimiter) {
            Ok(Some(row)) => {
                if let Some(transaction) = parse_row(&row, columns) {
                    statement.transactions.push(transaction);
                }
            }
            Ok(None) => {}
            Err(e) => debug!(row = i, error = %e, "skipping unreadable CSV row"),
        }
    }
    statement.total_amount = statement.transactions_total();

    CsvOutcome::Recognized(statement)
}

/// Read one line as a record.
///
/// Each line gets its own reader, so an unbalanced quote only spoils the
/// row it appears in.
fn read_record(line: &str, delimiter: u8) -> csv::Result<Option<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    reader.records().next().transpose()
}

fn parse_row(row: &StringRecord, columns: Columns) -> Option<Transaction> {
    if row.len() < columns.width {
        return None;
    }

    let raw_date = row.get(columns.date).unwrap_or_default();
    let raw_description = row.get(columns.description).unwrap_or_default();
    let raw_amount = row.get(columns.amount).unwrap_or_default();
    if raw_date.is_empty() || raw_description.is_empty() || raw_amount.is_empty() {
        return None;
    }

    let normalized = strip_accents(raw_description).to_lowercase();
    if IGNORED_DESCRIPTIONS.iter().any(|d| normalized.contains(d)) {
        return None;
    }

    let amount = match parse_amount_flexible(raw_amount) {
        Ok(amount) => amount,
        Err(e) => {
            debug!(error = %e, "skipping CSV row");
            return None;
        }
    };

    let description = clean_description(raw_description);
    Some(Transaction {
        date: format_date(raw_date),
        category: detect_category(&description),
        description,
        amount: amount.abs(),
        city: String::new(),
        installment: None,
    })
}

/// Reduce `YYYY-MM-DD`, `DD/MM/YYYY` or `DD/MM` to `DD/MM`.
///
/// Anything else is returned trimmed but otherwise untouched.
fn format_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if RE_DATE_DASH.is_match(trimmed) {
        let parts: Vec<&str> = trimmed.split('-').collect();
        return format!("{}/{}", parts[2], parts[1]);
    }
    if RE_DATE_SLASH.is_match(trimmed) {
        return trimmed[..5].to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const COMMA_SAMPLE: &str = "data,lançamento,valor
2025-02-09,PANVEL FARMACIAS,21.99

2025-02-10,PAGAMENTO EFETUADO,-1500.00
2025-02-11,\"99 TAXI, CORRIDA\",12.50
2025-02-12,ZAFFARI
2025-02-13,,10.00
2025-02-14,LOJA XPTO,abc
";

    #[test]
    fn test_parse_comma_file() {
        let statement = CsvStatement::parse(COMMA_SAMPLE).statement;
        assert_eq!(statement.bank_name, "CSV");
        assert_eq!(statement.transactions.len(), 2);

        let first = &statement.transactions[0];
        assert_eq!(first.date, "09/02");
        assert_eq!(first.amount, dec("21.99"));
        assert_eq!(first.category, Category::Health);

        let second = &statement.transactions[1];
        assert_eq!(second.description, "99 TAXI, CORRIDA");
        assert_eq!(second.category, Category::Transport);

        assert_eq!(statement.total_amount, dec("34.49"));
    }

    #[test]
    fn test_ignores_payment_rows() {
        let statement = CsvStatement::parse(COMMA_SAMPLE).statement;
        assert!(statement
            .transactions
            .iter()
            .all(|t| !t.description.to_lowercase().contains("pagamento")));
    }

    #[test]
    fn test_parse_semicolon_file() {
        let text = "Data;Lançamento;Valor;Cartão\n\
                    09/02/2025;SUPERMERCADO ZAFFARI;1.234,56;1234\n\
                    10/02;Estorno compra;-50,00;1234\n\
                    11/02;NETFLIX.COM;-39,90;1234\n";
        let statement = CsvStatement::parse(text).statement;
        assert_eq!(statement.transactions.len(), 2);
        assert_eq!(statement.transactions[0].date, "09/02");
        assert_eq!(statement.transactions[0].amount, dec("1234.56"));
        assert_eq!(statement.transactions[1].amount, dec("39.90"));
        assert_eq!(statement.transactions[1].category, Category::Leisure);
        assert_eq!(statement.total_amount, dec("1274.46"));
    }

    #[test]
    fn test_unbalanced_quote_only_skips_its_row() {
        let text = "data,lancamento,valor\n\
                    2025-02-09,\"PANVEL,21.99\n\
                    2025-02-10,UBER,10.00\n\
                    2025-02-11,ZAFFARI,5.00\n";
        let statement = CsvStatement::parse(text).statement;
        let descriptions: Vec<&str> =
            statement.transactions.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["UBER", "ZAFFARI"]);
        assert_eq!(statement.total_amount, dec("15.00"));
    }

    #[test]
    fn test_decomposed_accents() {
        let text = "data,lanc\u{0327}amento,valor\n\
                    2025-02-09,PANVEL,21.99\n\
                    2025-02-10,DEVOLUC\u{0327}A\u{0303}O LOJA,-30.00\n";
        let statement = CsvStatement::parse(text).statement;
        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.transactions[0].description, "PANVEL");
    }

    #[test]
    fn test_missing_header_yields_empty_statement() {
        let text = "data,lancamento,descricao\n2025-02-09,PANVEL,21.99\n";
        let statement = CsvStatement::parse(text).statement;
        assert!(statement.transactions.is_empty());
        assert_eq!(statement.total_amount, Decimal::ZERO);
        assert!(matches!(
            parse_outcome(text),
            CsvOutcome::NotThisFormat { ref missing } if missing == &vec!["valor"]
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(CsvStatement::parse("").statement.transactions.is_empty());
        assert!(CsvStatement::parse("\n  \n").statement.transactions.is_empty());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("data;lancamento;valor"), b';');
        assert_eq!(detect_delimiter("data,lancamento,valor"), b',');
        assert_eq!(detect_delimiter("data;lancamento,valor"), b',');
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-11-15"), "15/11");
        assert_eq!(format_date("15/11/2024"), "15/11");
        assert_eq!(format_date("15/11"), "15/11");
        assert_eq!(format_date(" Nov 15 "), "Nov 15");
    }
}
